//! # Runtime: lifecycle of the whole system.
//!
//! The [`Runtime`] owns every component (registry, store facade, dependency
//! graph, mailboxes, observability bus) and walks the state machine
//! `CONFIGURING → RUNNING → STOPPED`.
//!
//! ## Architecture
//! ```text
//! RegisterController / host() ──► Registry (+ mailbox per controller)
//!                                     │
//! Start ──► Multiplexer::activate(registry snapshot)
//!       ──► initial kick into every mailbox
//!       ──► spawn one ControllerActor per hosted controller
//!                                     │
//! Stop ──► cancel token ──► streams drain, watch tasks exit
//!      ──► join actors (up to Config::grace), report stragglers
//! ```
//!
//! ## Rules
//! - Registration (external or hosted) is permitted only while configuring.
//! - `Start` fails unless configuring; `Stop` fails unless running.
//! - After `Stop`, every adapter call fails with `RUNTIME_STOPPED`.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::adapter::Adapter;
use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::graph::Multiplexer;
use crate::mailbox::Mailboxes;
use crate::registry::{ControllerToken, Input, Output, Registry};
use crate::store::{MemoryStore, Store};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::actor::{ActorExitReason, ActorParams, ControllerActor};
use super::controller::Controller;
use super::shared::{RuntimeState, Shared};

/// A hosted controller waiting for `Start`.
struct Hosted {
    controller: Arc<dyn Controller>,
    token: ControllerToken,
}

/// A running hosted-controller actor.
struct RunningActor {
    name: String,
    handle: JoinHandle<ActorExitReason>,
}

/// The controller runtime.
pub struct Runtime {
    shared: Arc<Shared>,
    // Kept alive for the process lifetime; dropping it aborts the workers.
    _subs: Arc<SubscriberSet>,
    hosted: Mutex<Vec<Hosted>>,
    actors: Mutex<Vec<RunningActor>>,
}

/// Builder for constructing a [`Runtime`] with optional features.
pub struct RuntimeBuilder {
    cfg: Config,
    store: Option<Arc<dyn Store>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RuntimeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            store: None,
            subscribers: Vec::new(),
        }
    }

    /// Uses an external store instead of the built-in [`MemoryStore`].
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets observability subscribers.
    ///
    /// Subscribers receive runtime events (registration, reconcile signals,
    /// watch churn, actor lifecycle) through dedicated workers with bounded
    /// queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the runtime.
    ///
    /// Must be called within a tokio runtime: subscriber workers are spawned
    /// here.
    pub fn build(self) -> Arc<Runtime> {
        let capacity = self.cfg.bus_capacity_clamped();
        let bus = Bus::new(capacity);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::with_capacity(capacity)));
        let cancel = CancellationToken::new();
        let mailboxes = Arc::new(Mailboxes::new());
        let graph = Multiplexer::new(
            Arc::clone(&store),
            Arc::clone(&mailboxes),
            bus.clone(),
            self.cfg.watch_backoff,
            cancel.child_token(),
        );

        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let _listener = subs.spawn_listener(&bus, cancel.clone());

        let shared = Arc::new(Shared::new(
            self.cfg, Registry::new(), store, graph, mailboxes, bus, cancel,
        ));

        Arc::new(Runtime {
            shared,
            _subs: subs,
            hosted: Mutex::new(Vec::new()),
            actors: Mutex::new(Vec::new()),
        })
    }
}

impl Runtime {
    /// Starts a builder.
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    /// Builds a runtime with defaults (in-memory store, no subscribers).
    pub fn new(cfg: Config) -> Arc<Self> {
        RuntimeBuilder::new(cfg).build()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeState {
        self.shared.state()
    }

    /// A handle for controller-facing operations.
    pub fn adapter(&self) -> Adapter {
        Adapter::new(Arc::clone(&self.shared))
    }

    /// A receiver for runtime observability events (useful in tests and
    /// ad-hoc tooling; prefer [`Subscribe`] for long-lived consumers).
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<RuntimeEvent> {
        self.shared.bus.subscribe()
    }

    /// Registers an external controller and issues its token.
    ///
    /// Permitted only before `Start`.
    pub async fn register_controller(
        &self,
        name: &str,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
    ) -> Result<ControllerToken, RuntimeError> {
        match self.shared.state() {
            RuntimeState::Configuring => {}
            RuntimeState::Running => return Err(RuntimeError::RuntimeStarted),
            RuntimeState::Stopped => return Err(RuntimeError::RuntimeStopped),
        }

        let token = self.shared.registry.register(name, inputs, outputs).await?;
        self.shared.mailboxes.register(name);
        self.shared.bus.publish(
            RuntimeEvent::now(RuntimeEventKind::ControllerRegistered).with_controller(name),
        );
        Ok(token)
    }

    /// Registers a controller to be hosted in-process: at `Start` the
    /// runtime spawns an actor that drives its reconcile loop.
    ///
    /// Returns the controller's token (also reachable from its
    /// [`ReconcileContext`](super::ReconcileContext) during reconcile).
    pub async fn host(
        &self,
        controller: Arc<dyn Controller>,
    ) -> Result<ControllerToken, RuntimeError> {
        let name = controller.name().to_string();
        let token = self
            .register_controller(&name, controller.inputs(), controller.outputs())
            .await?;
        self.hosted.lock().await.push(Hosted {
            controller,
            token: token.clone(),
        });
        Ok(token)
    }

    /// Transitions `CONFIGURING → RUNNING`: activates the dependency graph
    /// from the registry snapshot, queues one initial reconcile kick per
    /// controller, and spawns hosted-controller actors.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        self.shared
            .transition(RuntimeState::Configuring, RuntimeState::Running)?;

        let snapshot = self.shared.registry.snapshot().await;
        self.shared.graph.activate(&snapshot);
        self.shared.mailboxes.signal_all();

        let mut actors = self.actors.lock().await;
        for hosted in self.hosted.lock().await.drain(..) {
            let params = ActorParams {
                restart: self.shared.cfg.restart,
                backoff: self.shared.cfg.reconcile_backoff,
                timeout: self.shared.cfg.reconcile_timeout_opt(),
            };
            let actor = ControllerActor::new(
                hosted.controller.clone(),
                self.adapter(),
                hosted.token,
                params,
                self.shared.bus.clone(),
            );
            let cancel = self.shared.cancel.child_token();
            actors.push(RunningActor {
                name: hosted.controller.name().to_string(),
                handle: tokio::spawn(async move { actor.run(cancel).await }),
            });
        }
        drop(actors);

        self.shared
            .bus
            .publish(RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        Ok(())
    }

    /// Transitions `RUNNING → STOPPED`: drains and closes every open stream,
    /// cancels watch tasks, and waits up to `Config::grace` for hosted
    /// controllers to exit.
    ///
    /// Fails with [`RuntimeError::GraceExceeded`] if some hosted controllers
    /// had to be aborted.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.shared
            .transition(RuntimeState::Running, RuntimeState::Stopped)?;

        // Let observers see the stop before the listener bridge is cancelled.
        self.shared
            .bus
            .publish(RuntimeEvent::now(RuntimeEventKind::RuntimeStopped));

        self.shared.cancel.cancel();
        self.shared.graph.shutdown();

        let deadline = Instant::now() + self.shared.cfg.grace;
        let mut stuck = Vec::new();
        for actor in self.actors.lock().await.drain(..) {
            let abort = actor.handle.abort_handle();
            match timeout_at(deadline, actor.handle).await {
                Ok(_) => {}
                Err(_elapsed) => {
                    // Cooperative shutdown failed; force-terminate.
                    abort.abort();
                    stuck.push(actor.name);
                }
            }
        }

        if stuck.is_empty() {
            Ok(())
        } else {
            self.shared.bus.publish(
                RuntimeEvent::now(RuntimeEventKind::GraceExceeded)
                    .with_error(format!("stuck: {stuck:?}")),
            );
            Err(RuntimeError::GraceExceeded {
                grace: self.shared.cfg.grace,
                stuck,
            })
        }
    }
}
