//! # Observability events emitted by the runtime.
//!
//! The [`RuntimeEventKind`] enum classifies event types across four
//! categories:
//! - **Runtime lifecycle**: start/stop of the runtime itself
//! - **Registration**: controller registration and input updates
//! - **Reconciliation**: mailbox signals and stream deliveries
//! - **Watches & actors**: watch churn, hosted-actor lifecycle, subscriber faults
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so events can be ordered even when delivered out-of-order
//! through async channels.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::resource::ResourceId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEventKind {
    // === Runtime lifecycle ===
    /// The runtime transitioned to running.
    RuntimeStarted,
    /// The runtime transitioned to stopped.
    RuntimeStopped,
    /// Some hosted controllers did not exit within the grace period.
    GraceExceeded,

    // === Registration ===
    /// A controller registered successfully.
    ControllerRegistered,
    /// A controller atomically replaced its input set.
    InputsUpdated,

    // === Reconciliation ===
    /// A controller's mailbox transitioned from empty to full.
    ReconcileSignaled,
    /// A reconcile event was delivered on an open stream.
    ReconcileDelivered,

    // === Watches ===
    /// A store watch was (re)established for a subscription key.
    WatchOpened,
    /// A store watch failed and will be retried after a backoff delay.
    WatchRetry,
    /// The last subscriber left and the watch was closed.
    WatchClosed,

    // === Hosted controller actors ===
    /// A hosted controller began a reconcile attempt.
    ActorReconciling,
    /// A reconcile attempt failed and a retry is scheduled.
    ActorBackoff,
    /// A hosted actor exited because its restart policy forbids retrying.
    ActorExhausted,
    /// A hosted actor terminated permanently due to a fatal error.
    ActorDead,

    // === Subscriber faults ===
    /// A subscriber panicked during event processing.
    SubscriberPanicked,
    /// A subscriber dropped an event (queue full or worker closed).
    SubscriberOverflow,
}

/// Runtime observability event with optional metadata.
#[derive(Clone, Debug)]
pub struct RuntimeEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: RuntimeEventKind,
    /// Controller the event concerns, if applicable.
    pub controller: Option<String>,
    /// Resource the event concerns, if applicable.
    pub resource: Option<ResourceId>,
    /// Error label or message, if the event represents a failure.
    pub error: Option<String>,
    /// Attempt count (starting from 1), for actor events.
    pub attempt: Option<u64>,
    /// Backoff delay before retry, if relevant.
    pub delay: Option<Duration>,
}

impl RuntimeEvent {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn now(kind: RuntimeEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            resource: None,
            error: None,
            attempt: None,
            delay: None,
        }
    }

    /// Attaches a controller name.
    pub fn with_controller(mut self, name: impl Into<String>) -> Self {
        self.controller = Some(name.into());
        self
    }

    /// Attaches a resource address.
    pub fn with_resource(mut self, rid: ResourceId) -> Self {
        self.resource = Some(rid);
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches an attempt count.
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay.
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        RuntimeEvent::now(RuntimeEventKind::SubscriberOverflow)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        RuntimeEvent::now(RuntimeEventKind::SubscriberPanicked)
            .with_controller(subscriber)
            .with_error(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = RuntimeEvent::now(RuntimeEventKind::RuntimeStarted);
        let b = RuntimeEvent::now(RuntimeEventKind::RuntimeStopped);
        assert!(b.seq > a.seq);
    }
}
