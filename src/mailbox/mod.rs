//! # Reconcile queue: coalescing mailboxes.
//!
//! The delivery contract between the watch multiplexer and reconcile
//! streams: at most one pending signal per controller, eventual delivery
//! after any causal event.

mod core;
mod registry;

pub use self::core::Mailbox;
pub use registry::Mailboxes;
