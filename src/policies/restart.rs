//! # Restart policies for hosted controller actors.
//!
//! [`RestartPolicy`] decides what a controller actor does after a reconcile
//! attempt fails with a retryable error.
//!
//! - [`RestartPolicy::Never`] the actor exits on the first failure.
//! - [`RestartPolicy::OnFailure`] failed attempts are retried with backoff
//!   (default).

/// Policy controlling retries of failed reconcile attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Exit the actor after the first failed reconcile.
    Never,
    /// Retry failed reconciles with backoff (default). Fatal errors are
    /// never retried regardless of policy.
    #[default]
    OnFailure,
}

impl RestartPolicy {
    /// True if a retryable failure should be retried under this policy.
    pub fn allows_retry(&self) -> bool {
        matches!(self, RestartPolicy::OnFailure)
    }
}
