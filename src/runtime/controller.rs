//! # Controller abstraction for hosted execution.
//!
//! A [`Controller`] declares its name, inputs and outputs, and implements
//! one operation: `reconcile`, which reads current inputs and writes outputs
//! to move the system toward its desired state. The runtime drives the loop:
//! it opens the reconcile stream, waits for coalesced signals, and calls
//! `reconcile` once per delivery (retrying per policy on failure).
//!
//! ## Rules
//! - `reconcile` must reread state every time; a signal is never a diff.
//! - Implementations must check [`ReconcileContext::is_cancelled`] in long
//!   loops to enable graceful shutdown.
//! - Returning [`ControllerError::Fatal`] terminates the actor permanently.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapter::{Adapter, Condition, WatchOutcome};
use crate::error::{ControllerError, RuntimeError};
use crate::registry::{ControllerToken, Input, Output};
use crate::resource::{LabelQuery, Resource, ResourceId};

/// A reconciling unit of work hosted by the runtime.
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    /// Returns the globally unique controller name.
    fn name(&self) -> &str;

    /// Declared watch subscriptions.
    fn inputs(&self) -> Vec<Input>;

    /// Declared write claims (fixed for the controller's lifetime).
    fn outputs(&self) -> Vec<Output>;

    /// One reconcile pass: read inputs, converge outputs.
    async fn reconcile(&self, cx: &ReconcileContext) -> Result<(), ControllerError>;
}

/// Token-scoped view of the adapter handed to a hosted controller.
///
/// Thin delegation: every method is the corresponding [`Adapter`] operation
/// with the controller's own credential filled in.
pub struct ReconcileContext {
    adapter: Adapter,
    token: ControllerToken,
    cancel: CancellationToken,
}

impl ReconcileContext {
    pub(crate) fn new(adapter: Adapter, token: ControllerToken, cancel: CancellationToken) -> Self {
        Self {
            adapter,
            token,
            cancel,
        }
    }

    /// The underlying adapter, for operations not wrapped here.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// The controller's credential.
    pub fn token(&self) -> &ControllerToken {
        &self.token
    }

    /// True once the runtime is shutting the controller down.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Point read. See [`Adapter::get`].
    pub async fn get(&self, rid: &ResourceId) -> Result<Resource, RuntimeError> {
        self.adapter.get(&self.token, rid).await
    }

    /// Snapshot listing. See [`Adapter::list`].
    pub async fn list(
        &self,
        namespace: &str,
        ty: &str,
        query: &LabelQuery,
    ) -> Result<Vec<Resource>, RuntimeError> {
        self.adapter.list(&self.token, namespace, ty, query).await
    }

    /// Conditional wait, cancelled alongside the controller.
    /// See [`Adapter::watch_for`].
    pub async fn watch_for(
        &self,
        rid: &ResourceId,
        condition: Condition,
    ) -> Result<WatchOutcome, RuntimeError> {
        self.adapter
            .watch_for(&self.token, rid, condition, &self.cancel)
            .await
    }

    /// Creates an owned output resource. See [`Adapter::create`].
    pub async fn create(&self, resource: Resource) -> Result<Resource, RuntimeError> {
        self.adapter.create(&self.token, resource).await
    }

    /// Optimistic-concurrency update. See [`Adapter::update`].
    pub async fn update(
        &self,
        current_version: u64,
        resource: Resource,
    ) -> Result<Resource, RuntimeError> {
        self.adapter.update(&self.token, current_version, resource).await
    }

    /// Announces destruction intent. See [`Adapter::teardown`].
    pub async fn teardown(&self, rid: &ResourceId) -> Result<bool, RuntimeError> {
        self.adapter.teardown(&self.token, rid).await
    }

    /// Destroys a ready resource. See [`Adapter::destroy`].
    pub async fn destroy(&self, rid: &ResourceId) -> Result<(), RuntimeError> {
        self.adapter.destroy(&self.token, rid).await
    }

    /// Appends finalizers. See [`Adapter::add_finalizers`].
    pub async fn add_finalizers(
        &self,
        rid: &ResourceId,
        finalizers: &[String],
    ) -> Result<Resource, RuntimeError> {
        self.adapter.add_finalizers(&self.token, rid, finalizers).await
    }

    /// Removes finalizers. See [`Adapter::remove_finalizers`].
    pub async fn remove_finalizers(
        &self,
        rid: &ResourceId,
        finalizers: &[String],
    ) -> Result<Resource, RuntimeError> {
        self.adapter
            .remove_finalizers(&self.token, rid, finalizers)
            .await
    }

    /// Requeues the controller itself. See [`Adapter::queue_reconcile`].
    pub async fn queue_reconcile(&self) -> Result<(), RuntimeError> {
        self.adapter.queue_reconcile(&self.token).await
    }
}
