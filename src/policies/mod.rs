//! Policies for supervising retries:
//!  - [`BackoffPolicy`] for delay growth (watch re-establishment, reconcile
//!    retries);
//!  - [`Jitter`] for de-synchronizing concurrent retries;
//!  - [`RestartPolicy`] for deciding whether a failed reconcile is retried.

mod backoff;
mod restart;

pub use backoff::{BackoffPolicy, Jitter};
pub use restart::RestartPolicy;
