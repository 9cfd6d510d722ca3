//! # Adapter service.
//!
//! Token-scoped operations that enforce the ownership/authorization matrix
//! on top of the store and the reconcile queue. This is the message surface
//! a transport exposes to external controllers, and the API hosted
//! controllers use directly.

mod authorize;
mod core;
mod stream;
mod watch_for;

pub use self::core::Adapter;
pub use stream::{ReconcileEvent, ReconcileStream};
pub use watch_for::{Condition, WatchOutcome};
