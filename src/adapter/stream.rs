//! # Reconcile event streams.
//!
//! The consumer half of a controller's mailbox: each pull clears the single
//! pending signal and yields one (empty) reconcile event. At most one stream
//! per controller is open at a time; dropping it releases the slot, and a
//! re-subscription re-establishes the initial-kick guarantee.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::mailbox::Mailbox;

/// One delivered reconcile signal. The payload is intentionally empty:
/// controllers reread their inputs instead of consuming change diffs.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct ReconcileEvent {}

/// Open reconcile stream for one controller.
#[derive(Debug)]
pub struct ReconcileStream {
    controller: String,
    mailbox: Arc<Mailbox>,
    cancel: CancellationToken,
    bus: Bus<RuntimeEvent>,
}

impl ReconcileStream {
    pub(crate) fn new(
        controller: String,
        mailbox: Arc<Mailbox>,
        cancel: CancellationToken,
        bus: Bus<RuntimeEvent>,
    ) -> Self {
        Self {
            controller,
            mailbox,
            cancel,
            bus,
        }
    }

    /// The controller this stream belongs to.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Waits for the next reconcile signal.
    ///
    /// Returns `None` once the runtime stops; pending signals are dropped at
    /// that point.
    pub async fn next(&mut self) -> Option<ReconcileEvent> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            _ = self.mailbox.recv() => {
                self.bus.publish(
                    RuntimeEvent::now(RuntimeEventKind::ReconcileDelivered)
                        .with_controller(self.controller.clone()),
                );
                Some(ReconcileEvent::default())
            }
        }
    }
}

impl Drop for ReconcileStream {
    fn drop(&mut self) {
        self.mailbox.detach();
    }
}
