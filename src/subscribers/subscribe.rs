//! # Subscriber contract.
//!
//! `Subscribe` is the extension point for plugging observability handlers
//! into the runtime. The [`SubscriberSet`](crate::subscribers::SubscriberSet)
//! gives each subscriber its own bounded delivery queue and worker, so a
//! slow or faulty handler can never stall the runtime or its peers.
//!
//! ## Contract
//! - Delivery is best-effort: when a subscriber's queue is full, events are
//!   dropped for it and a `SubscriberOverflow` event is published on the
//!   runtime bus.
//! - A panic inside `on_event` is contained to that delivery and reported
//!   as a `SubscriberPanicked` event; the worker keeps running.

use async_trait::async_trait;

use crate::events::RuntimeEvent;

/// An observability event handler with its own delivery queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Stable subscriber name, used to attribute overflow and panic events.
    fn name(&self) -> &'static str;

    /// Handles one event.
    ///
    /// Runs on the subscriber's dedicated worker; blocking here only delays
    /// this subscriber's own queue. Prefer async I/O and cooperative waits.
    async fn on_event(&self, event: &RuntimeEvent);

    /// Bound of this subscriber's delivery queue.
    ///
    /// Sized for bursty-but-brief load; raise it for handlers that batch or
    /// do slow I/O.
    fn queue_capacity(&self) -> usize {
        256
    }
}
