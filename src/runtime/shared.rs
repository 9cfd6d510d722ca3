//! # Shared runtime internals.
//!
//! The components every handle (runtime, adapter, streams, actors) hangs off
//! of: registry, store, graph, mailboxes, observability bus, and the runtime
//! state cell.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, RuntimeEvent};
use crate::graph::Multiplexer;
use crate::mailbox::Mailboxes;
use crate::registry::Registry;
use crate::store::Store;

/// Lifecycle state of the runtime itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RuntimeState {
    /// Accepting registrations; subscriptions not yet active.
    Configuring = 0,
    /// Started; adapter operations are served.
    Running = 1,
    /// Stopped; every call fails with `RUNTIME_STOPPED`.
    Stopped = 2,
}

impl RuntimeState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RuntimeState::Configuring,
            1 => RuntimeState::Running,
            _ => RuntimeState::Stopped,
        }
    }
}

/// Internals shared by the runtime and every adapter handle.
pub(crate) struct Shared {
    pub(crate) cfg: Config,
    pub(crate) registry: Registry,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) graph: Multiplexer,
    pub(crate) mailboxes: Arc<Mailboxes>,
    pub(crate) bus: Bus<RuntimeEvent>,
    pub(crate) cancel: CancellationToken,
    state: AtomicU8,
}

impl Shared {
    pub(crate) fn new(
        cfg: Config,
        registry: Registry,
        store: Arc<dyn Store>,
        graph: Multiplexer,
        mailboxes: Arc<Mailboxes>,
        bus: Bus<RuntimeEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            registry,
            store,
            graph,
            mailboxes,
            bus,
            cancel,
            state: AtomicU8::new(RuntimeState::Configuring as u8),
        }
    }

    /// Current lifecycle state.
    pub(crate) fn state(&self) -> RuntimeState {
        RuntimeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Atomically transitions `from → to`; fails with the state-appropriate
    /// error otherwise.
    pub(crate) fn transition(
        &self,
        from: RuntimeState,
        to: RuntimeState,
    ) -> Result<(), RuntimeError> {
        self.state
            .compare_exchange(
                from as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|observed| match RuntimeState::from_u8(observed) {
                RuntimeState::Configuring => RuntimeError::RuntimeNotStarted,
                RuntimeState::Running => RuntimeError::RuntimeStarted,
                RuntimeState::Stopped => RuntimeError::RuntimeStopped,
            })
    }

    /// Fails unless the runtime is running.
    pub(crate) fn ensure_running(&self) -> Result<(), RuntimeError> {
        match self.state() {
            RuntimeState::Running => Ok(()),
            RuntimeState::Configuring => Err(RuntimeError::RuntimeNotStarted),
            RuntimeState::Stopped => Err(RuntimeError::RuntimeStopped),
        }
    }

    /// Fails only if the runtime has been stopped.
    pub(crate) fn ensure_not_stopped(&self) -> Result<(), RuntimeError> {
        match self.state() {
            RuntimeState::Stopped => Err(RuntimeError::RuntimeStopped),
            _ => Ok(()),
        }
    }
}
