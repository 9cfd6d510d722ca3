//! # ControllerActor: drives one hosted controller.
//!
//! Supervises the reconcile loop of one [`Controller`] with policies:
//! - retries per [`RestartPolicy`],
//! - delays per [`BackoffPolicy`],
//! - optional per-attempt timeout,
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## Architecture
//! ```text
//! Runtime::start() ──► ControllerActor::run()
//!
//! loop {
//!   ├─► wait for reconcile signal (coalesced) or cancellation
//!   └─► attempt loop {
//!         ├─► attempt += 1, publish ActorReconciling
//!         ├─► reconcile() (optionally under timeout)
//!         ├─► Ok         → reset backoff, wait for next signal
//!         ├─► Fatal      → publish ActorDead → exit
//!         ├─► Canceled   → exit
//!         └─► retryable  → policy Never? publish ActorExhausted → exit
//!                          else publish ActorBackoff → sleep → retry
//!       }
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** within one actor (never parallel): this
//!   is what guarantees at-most-one reconcile in flight per controller.
//! - The attempt counter increments on each invocation and never resets.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::adapter::Adapter;
use crate::error::ControllerError;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::registry::ControllerToken;

use super::controller::{Controller, ReconcileContext};

/// Reason why a controller actor exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExitReason {
    /// A retryable failure occurred and the policy forbids retrying.
    PolicyExhausted,
    /// The actor observed shutdown or stream closure.
    Cancelled,
    /// The controller returned a fatal error.
    Fatal,
}

/// Configuration parameters for one controller actor.
#[derive(Clone)]
pub(crate) struct ActorParams {
    pub restart: RestartPolicy,
    pub backoff: BackoffPolicy,
    pub timeout: Option<Duration>,
}

/// Drives one hosted controller's reconcile loop.
pub(crate) struct ControllerActor {
    controller: Arc<dyn Controller>,
    adapter: Adapter,
    token: ControllerToken,
    params: ActorParams,
    bus: Bus<RuntimeEvent>,
}

impl ControllerActor {
    pub(crate) fn new(
        controller: Arc<dyn Controller>,
        adapter: Adapter,
        token: ControllerToken,
        params: ActorParams,
        bus: Bus<RuntimeEvent>,
    ) -> Self {
        Self {
            controller,
            adapter,
            token,
            params,
            bus,
        }
    }

    /// Runs the actor until shutdown, policy exhaustion, or a fatal error.
    pub(crate) async fn run(self, cancel: CancellationToken) -> ActorExitReason {
        let name = self.controller.name().to_string();

        let mut stream = match self.adapter.reconcile_events(&self.token).await {
            Ok(stream) => stream,
            Err(e) => {
                self.bus.publish(
                    RuntimeEvent::now(RuntimeEventKind::ActorDead)
                        .with_controller(name.as_str())
                        .with_error(e.to_string()),
                );
                return ActorExitReason::Cancelled;
            }
        };

        let cx = ReconcileContext::new(
            self.adapter.clone(),
            self.token.clone(),
            cancel.clone(),
        );
        let mut attempt: u64 = 0;

        loop {
            let signal = select! {
                _ = cancel.cancelled() => return ActorExitReason::Cancelled,
                signal = stream.next() => signal,
            };
            if signal.is_none() {
                return ActorExitReason::Cancelled;
            }

            let mut prev_delay: Option<Duration> = None;
            loop {
                attempt += 1;
                self.bus.publish(
                    RuntimeEvent::now(RuntimeEventKind::ActorReconciling)
                        .with_controller(name.as_str())
                        .with_attempt(attempt),
                );

                match self.reconcile_once(&cx).await {
                    Ok(()) => break,
                    Err(e) if e.is_fatal() => {
                        self.bus.publish(
                            RuntimeEvent::now(RuntimeEventKind::ActorDead)
                                .with_controller(name.as_str())
                                .with_attempt(attempt)
                                .with_error(e.to_string()),
                        );
                        return ActorExitReason::Fatal;
                    }
                    Err(ControllerError::Canceled) => return ActorExitReason::Cancelled,
                    Err(e) => {
                        if !self.params.restart.allows_retry() {
                            self.bus.publish(
                                RuntimeEvent::now(RuntimeEventKind::ActorExhausted)
                                    .with_controller(name.as_str())
                                    .with_attempt(attempt)
                                    .with_error(e.to_string()),
                            );
                            return ActorExitReason::PolicyExhausted;
                        }

                        let delay = self.params.backoff.next(prev_delay);
                        prev_delay = Some(delay);
                        self.bus.publish(
                            RuntimeEvent::now(RuntimeEventKind::ActorBackoff)
                                .with_controller(name.as_str())
                                .with_attempt(attempt)
                                .with_delay(delay)
                                .with_error(e.to_string()),
                        );

                        select! {
                            _ = cancel.cancelled() => return ActorExitReason::Cancelled,
                            _ = time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }

    async fn reconcile_once(&self, cx: &ReconcileContext) -> Result<(), ControllerError> {
        match self.params.timeout {
            Some(limit) => match time::timeout(limit, self.controller.reconcile(cx)).await {
                Ok(result) => result,
                Err(_) => Err(ControllerError::fail(format!(
                    "reconcile timed out after {limit:?}"
                ))),
            },
            None => self.controller.reconcile(cx).await,
        }
    }
}
