//! Runtime events: types and broadcast bus.
//!
//! This module groups the observability event **data model** and the **bus**
//! used to publish/subscribe to events emitted by the registry, the watch
//! multiplexer, reconcile streams and hosted controller actors.
//!
//! ## Contents
//! - [`RuntimeEventKind`], [`RuntimeEvent`] event classification and metadata
//! - [`Bus`] thin generic wrapper over `tokio::sync::broadcast`, also used by
//!   the in-memory store for its change feed

mod bus;
mod event;

pub use bus::Bus;
pub use event::{RuntimeEvent, RuntimeEventKind};
