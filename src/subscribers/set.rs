//! # SubscriberSet: per-subscriber delivery lanes.
//!
//! Fans runtime events out to subscribers without ever awaiting them. Each
//! subscriber gets a *lane*: a bounded queue drained by its own worker task.
//! Publishing walks the lanes with `try_send`, so `emit` is non-blocking no
//! matter how slow the handlers are.
//!
//! ## Fault reporting
//! Drops and panics are themselves observability events. A full or closed
//! lane publishes `SubscriberOverflow`; a panicking handler publishes
//! `SubscriberPanicked` and its worker keeps draining. Fault events caused
//! by other fault events are swallowed, so one broken subscriber cannot
//! start a feedback loop on the bus.
//!
//! ```text
//!    emit(&RuntimeEvent) ── try_send ──► lane "log_writer"  ─► worker ─► on_event()
//!                       ── try_send ──► lane "metrics"     ─► worker ─► on_event()
//!                              │                                 │
//!                         queue full?                         panicked?
//!                              ▼                                 ▼
//!                      SubscriberOverflow ──► bus ◄── SubscriberPanicked
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};

use super::subscribe::Subscribe;

/// One subscriber's bounded queue plus the worker draining it.
struct Lane {
    name: &'static str,
    feed: mpsc::Sender<Arc<RuntimeEvent>>,
    driver: JoinHandle<()>,
}

/// Non-blocking fan-out over a fixed set of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    faults: Bus<RuntimeEvent>,
}

impl SubscriberSet {
    /// Builds one lane per subscriber and spawns its worker.
    ///
    /// `faults` is the runtime bus; overflow and panic reports are published
    /// there so they reach the remaining healthy subscribers.
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, faults: Bus<RuntimeEvent>) -> Self {
        let lanes = subscribers
            .into_iter()
            .map(|sub| {
                let name = sub.name();
                let (feed, queue) = mpsc::channel(sub.queue_capacity().max(1));
                Lane {
                    name,
                    feed,
                    driver: spawn_driver(sub, queue, faults.clone()),
                }
            })
            .collect();

        Self { lanes, faults }
    }

    /// Hands one event to every lane without awaiting.
    ///
    /// A lane whose queue is full (or whose worker is gone) loses the event;
    /// the loss is published as `SubscriberOverflow` unless the event being
    /// dropped is itself a fault report.
    pub fn emit(&self, event: &RuntimeEvent) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.feed.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue_full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker_closed",
            };
            if !is_fault(event) {
                self.faults
                    .publish(RuntimeEvent::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Spawns the bridge between the runtime's event bus and this set.
    ///
    /// Lagging on the bus only skips events for observers; it never affects
    /// the runtime itself.
    pub fn spawn_listener(
        self: &Arc<Self>,
        bus: &Bus<RuntimeEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
            }
        })
    }

    /// Number of attached subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True if no subscribers are attached.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl Drop for SubscriberSet {
    fn drop(&mut self) {
        for lane in &self.lanes {
            lane.driver.abort();
        }
    }
}

/// True for events that report a subscriber fault. Faults triggered while
/// handling (or dropping) another fault are not re-reported.
fn is_fault(ev: &RuntimeEvent) -> bool {
    matches!(
        ev.kind,
        RuntimeEventKind::SubscriberPanicked | RuntimeEventKind::SubscriberOverflow
    )
}

/// Worker loop for one lane: drain the queue, contain panics, report them.
fn spawn_driver(
    sub: Arc<dyn Subscribe>,
    mut queue: mpsc::Receiver<Arc<RuntimeEvent>>,
    faults: Bus<RuntimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = queue.recv().await {
            let delivery = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
            if delivery.is_err() && !is_fault(&ev) {
                faults.publish(RuntimeEvent::subscriber_panicked(
                    sub.name(),
                    format!("while handling event seq={}", ev.seq),
                ));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use super::*;

    async fn expect_fault(
        rx: &mut tokio::sync::broadcast::Receiver<RuntimeEvent>,
        kind: RuntimeEventKind,
    ) -> RuntimeEvent {
        loop {
            let ev = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("expected a fault event")
                .expect("bus closed");
            if ev.kind == kind {
                return ev;
            }
        }
    }

    struct Boom;

    #[async_trait]
    impl Subscribe for Boom {
        fn name(&self) -> &'static str {
            "boom"
        }

        async fn on_event(&self, _event: &RuntimeEvent) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn panics_are_contained_and_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Boom)], bus.clone());

        set.emit(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        let fault = expect_fault(&mut rx, RuntimeEventKind::SubscriberPanicked).await;
        assert_eq!(fault.controller.as_deref(), Some("boom"));

        // The worker survived the panic and handles further deliveries.
        set.emit(&RuntimeEvent::now(RuntimeEventKind::RuntimeStopped));
        expect_fault(&mut rx, RuntimeEventKind::SubscriberPanicked).await;
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        fn name(&self) -> &'static str {
            "stuck"
        }

        async fn on_event(&self, _event: &RuntimeEvent) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn overflow_is_reported_on_the_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        // Capacity one and a worker that never finishes: a short burst must
        // overflow the lane.
        for _ in 0..4 {
            set.emit(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        }
        let fault = expect_fault(&mut rx, RuntimeEventKind::SubscriberOverflow).await;
        assert!(fault.error.as_deref().unwrap_or_default().contains("stuck"));
    }

    #[tokio::test]
    async fn dropped_fault_events_are_not_re_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        for _ in 0..4 {
            set.emit(&RuntimeEvent::subscriber_overflow("elsewhere", "queue_full"));
        }
        let quiet = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(quiet.is_err(), "fault events must not cascade");
    }
}
