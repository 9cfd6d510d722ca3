//! # Broadcast bus for runtime and store events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used in two
//! places: the store publishes [`StoreEvent`](crate::store::StoreEvent)s that
//! the watch multiplexer fans out, and the runtime publishes
//! [`RuntimeEvent`](crate::events::RuntimeEvent)s that observability
//! subscribers consume.
//!
//! ## Key characteristics:
//! - **Broadcast semantics**: all active receivers get a clone of each event
//! - **Non-persistent**: events are lost if there are no active receivers
//! - **Bounded capacity**: slow receivers observe `Lagged` when they fall
//!   behind; consumers translate that into a resync (`BOOKMARK`) or a drop

use tokio::sync::broadcast;

/// Broadcast channel for events of type `T`.
#[derive(Debug)]
pub struct Bus<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Bus<T> {
    /// Creates a new bus with the given channel capacity.
    ///
    /// When capacity is exceeded, the oldest undelivered events are dropped
    /// for the lagging receiver (it sees `Lagged` on its next `recv`).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no active receivers the event is dropped silently; the
    /// system operates without observers.
    pub fn publish(&self, ev: T) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new independent receiver for all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
