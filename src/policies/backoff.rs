//! # Backoff policy for retries.
//!
//! [`BackoffPolicy`] controls how retry delays grow. The runtime uses it in
//! two places: the watch multiplexer re-establishing failed store watches,
//! and hosted controller actors retrying failed reconcile attempts.
//!
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::jitter`] randomization to de-synchronize retries.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use controlvisor::policies::{BackoffPolicy, Jitter};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: Jitter::None,
//! };
//!
//! // First retry uses `first`.
//! assert_eq!(backoff.next(None), Duration::from_millis(100));
//! // Then the previous delay grows by `factor`…
//! assert_eq!(
//!     backoff.next(Some(Duration::from_millis(100))),
//!     Duration::from_millis(200),
//! );
//! // …capped at `max`.
//! assert_eq!(backoff.next(Some(Duration::from_secs(20))), Duration::from_secs(10));
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied to a computed backoff delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Use the exact computed delay. Predictable; fine when only a handful
    /// of watches or actors can retry at once.
    #[default]
    None,
    /// Random delay in `[0, delay]`. Maximum load spreading.
    Full,
    /// `delay/2 + random[0, delay/2]`. Preserves most of the backoff while
    /// still breaking retry synchronization.
    Equal,
}

impl Jitter {
    fn apply(&self, delay: Duration) -> Duration {
        let ms = (delay.as_millis().min(u128::from(u64::MAX))) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                let jitter = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + jitter)
            }
        }
    }
}

/// Capped multiplicative retry backoff.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization policy.
    pub jitter: Jitter,
}

impl Default for BackoffPolicy {
    /// Returns a policy with `first = 100ms`, `max = 30s`, `factor = 2.0`,
    /// no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: Jitter::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the next delay from the previous one.
    ///
    /// - `prev = None` returns `first` clamped to `max`.
    /// - Otherwise the previous delay is multiplied by `factor` and capped
    ///   at `max`. A non-finite product saturates to `max`.
    pub fn next(&self, prev: Option<Duration>) -> Duration {
        let unclamped = match prev {
            None => self.first,
            Some(d) => {
                let mul = d.as_secs_f64() * self.factor;
                if mul.is_finite() {
                    d.mul_f64(self.factor)
                } else {
                    self.max
                }
            }
        };
        self.jitter.apply(unclamped.min(self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_capped() {
        let backoff = BackoffPolicy {
            first: Duration::from_millis(1),
            max: Duration::from_millis(8),
            factor: 2.0,
            jitter: Jitter::None,
        };

        let mut prev = None;
        let mut delays = Vec::new();
        for _ in 0..5 {
            let d = backoff.next(prev);
            delays.push(d);
            prev = Some(d);
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1),
                Duration::from_millis(2),
                Duration::from_millis(4),
                Duration::from_millis(8),
                Duration::from_millis(8),
            ]
        );
    }

    #[test]
    fn full_jitter_stays_in_range() {
        let backoff = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: Jitter::Full,
        };
        for _ in 0..50 {
            assert!(backoff.next(None) <= Duration::from_millis(100));
        }
    }

    #[test]
    fn equal_jitter_preserves_half() {
        let backoff = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: Jitter::Equal,
        };
        for _ in 0..50 {
            let d = backoff.next(None);
            assert!(d >= Duration::from_millis(50));
            assert!(d <= Duration::from_millis(100));
        }
    }
}
