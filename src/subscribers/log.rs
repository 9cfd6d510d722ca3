//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints runtime events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [registered] controller=configs-ctrl
//! [signaled] controller=configs-ctrl
//! [reconciling] controller=configs-ctrl attempt=1
//! [backoff] controller=configs-ctrl delay=200ms err="reconcile failed: ..."
//! [watch-retry] err="..." delay=100ms
//! [started]
//! [stopped]
//! ```

use async_trait::async_trait;

use crate::events::{RuntimeEvent, RuntimeEventKind};

use super::subscribe::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// implement a custom [`Subscribe`] for structured logging or metrics
/// collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &RuntimeEvent) {
        match e.kind {
            RuntimeEventKind::RuntimeStarted => println!("[started]"),
            RuntimeEventKind::RuntimeStopped => println!("[stopped]"),
            RuntimeEventKind::GraceExceeded => {
                println!("[grace-exceeded] err={:?}", e.error);
            }
            RuntimeEventKind::ControllerRegistered => {
                println!("[registered] controller={:?}", e.controller);
            }
            RuntimeEventKind::InputsUpdated => {
                println!("[inputs-updated] controller={:?}", e.controller);
            }
            RuntimeEventKind::ReconcileSignaled => {
                println!("[signaled] controller={:?}", e.controller);
            }
            RuntimeEventKind::ReconcileDelivered => {
                println!("[delivered] controller={:?}", e.controller);
            }
            RuntimeEventKind::WatchOpened => println!("[watch-opened]"),
            RuntimeEventKind::WatchClosed => println!("[watch-closed]"),
            RuntimeEventKind::WatchRetry => {
                println!("[watch-retry] err={:?} delay={:?}", e.error, e.delay);
            }
            RuntimeEventKind::ActorReconciling => {
                if let (Some(controller), Some(attempt)) = (&e.controller, e.attempt) {
                    println!("[reconciling] controller={controller} attempt={attempt}");
                }
            }
            RuntimeEventKind::ActorBackoff => {
                println!(
                    "[backoff] controller={:?} delay={:?} err={:?}",
                    e.controller, e.delay, e.error
                );
            }
            RuntimeEventKind::ActorExhausted => {
                println!(
                    "[exhausted] controller={:?} err={:?}",
                    e.controller, e.error
                );
            }
            RuntimeEventKind::ActorDead => {
                println!("[dead] controller={:?} err={:?}", e.controller, e.error);
            }
            RuntimeEventKind::SubscriberPanicked | RuntimeEventKind::SubscriberOverflow => {
                println!("[subscriber-fault] err={:?}", e.error);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
