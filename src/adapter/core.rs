//! # Adapter: token-scoped operations over the store.
//!
//! The surface controllers talk to. Every call resolves `controller_token`
//! against the registry, applies the authorization matrix and the lifecycle
//! gates, and only then dispatches to the store.
//!
//! ## Rules
//! - Identity fields of a persisted resource never change; `Update` carries
//!   the caller's spec and labels but preserves owner, phase, finalizers and
//!   creation time from the stored state.
//! - `Teardown` is idempotent: on an already-tearing-down resource it only
//!   reports readiness.
//! - Mutations are single-shot; the runtime never retries on the caller's
//!   behalf.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::events::{RuntimeEvent, RuntimeEventKind};
use crate::lifecycle;
use crate::registry::{ControllerDescriptor, ControllerToken, Input};
use crate::resource::{LabelQuery, Phase, Resource, ResourceId};
use crate::runtime::shared::{RuntimeState, Shared};
use crate::store::{MetaPatch, StoreEventKind};

use super::authorize;
use super::stream::ReconcileStream;
use super::watch_for::{Condition, WatchOutcome};

/// Handle for controller-facing operations.
///
/// Cheap to clone; a transport typically creates one per connection.
#[derive(Clone)]
pub struct Adapter {
    shared: Arc<Shared>,
}

impl Adapter {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    async fn resolve(&self, token: &ControllerToken) -> Result<ControllerDescriptor, RuntimeError> {
        self.shared.registry.resolve(token).await
    }

    /// Opens the controller's reconcile stream.
    ///
    /// The mailbox is a single-consumer cell: a second concurrent stream is
    /// rejected. Opening the stream signals one initial kick, so a
    /// (re)subscribing controller always reconciles at least once.
    pub async fn reconcile_events(
        &self,
        token: &ControllerToken,
    ) -> Result<ReconcileStream, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;

        let mailbox = self
            .shared
            .mailboxes
            .get(&desc.name)
            .ok_or(RuntimeError::InvalidToken)?;
        if !mailbox.try_attach() {
            return Err(RuntimeError::InvalidArgument {
                reason: format!("reconcile stream already open for '{}'", desc.name),
            });
        }
        mailbox.signal();

        Ok(ReconcileStream::new(
            desc.name,
            mailbox,
            self.shared.cancel.clone(),
            self.shared.bus.clone(),
        ))
    }

    /// Signals the caller's own mailbox (coalesces with pending signals).
    pub async fn queue_reconcile(&self, token: &ControllerToken) -> Result<(), RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        if self.shared.mailboxes.signal(&desc.name) {
            self.shared.bus.publish(
                RuntimeEvent::now(RuntimeEventKind::ReconcileSignaled)
                    .with_controller(desc.name),
            );
        }
        Ok(())
    }

    /// Atomically replaces the caller's input set.
    ///
    /// While the runtime is running, the dependency graph is adjusted by the
    /// delta and the caller receives an initial kick for newly added inputs.
    pub async fn update_inputs(
        &self,
        token: &ControllerToken,
        inputs: Vec<Input>,
    ) -> Result<(), RuntimeError> {
        self.shared.ensure_not_stopped()?;
        let delta = self.shared.registry.update_inputs(token, inputs).await?;

        if self.shared.state() == RuntimeState::Running {
            for input in &delta.removed {
                self.shared.graph.unsubscribe(&delta.controller, input);
            }
            for input in &delta.added {
                self.shared.graph.subscribe(&delta.controller, input);
            }
            if !delta.added.is_empty() {
                self.shared.mailboxes.signal(&delta.controller);
            }
        }

        self.shared.bus.publish(
            RuntimeEvent::now(RuntimeEventKind::InputsUpdated).with_controller(delta.controller),
        );
        Ok(())
    }

    /// Point read of a declared input or output.
    pub async fn get(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
    ) -> Result<Resource, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        rid.validate()?;
        authorize::read(&desc, rid)?;
        self.shared.store.get(rid).await
    }

    /// Snapshot listing over `(namespace, type)`, filtered by the label
    /// query and by the caller's per-resource coverage (an exact-id input
    /// yields at most its own resource).
    pub async fn list(
        &self,
        token: &ControllerToken,
        namespace: &str,
        ty: &str,
        query: &LabelQuery,
    ) -> Result<Vec<Resource>, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        authorize::list(&desc, namespace, ty)?;

        let resources = self.shared.store.list(namespace, ty, query).await?;
        Ok(resources
            .into_iter()
            .filter(|r| desc.may_read(&r.resource_id()))
            .collect())
    }

    /// Blocks until the target satisfies `condition` or is destroyed.
    ///
    /// Returns immediately if the condition already holds. Fails with
    /// [`RuntimeError::NotFound`] if the resource does not exist, and with
    /// [`RuntimeError::Cancelled`] on caller cancellation.
    pub async fn watch_for(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
        condition: Condition,
        cancel: &CancellationToken,
    ) -> Result<WatchOutcome, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        rid.validate()?;
        authorize::read(&desc, rid)?;

        // Watch before the existence probe: anything that happens after the
        // probe is guaranteed to reach the stream.
        let mut stream = self
            .shared
            .store
            .watch(&rid.namespace, &rid.ty, Some(&rid.id))
            .await?;
        let current = self.shared.store.get(rid).await?;
        if condition.holds(current.metadata()) {
            return Ok(WatchOutcome::satisfied(current));
        }
        let mut last = current;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                _ = self.shared.cancel.cancelled() => return Err(RuntimeError::RuntimeStopped),
                ev = stream.next() => {
                    let Some(ev) = ev else {
                        return Err(RuntimeError::RuntimeStopped);
                    };
                    match ev.kind {
                        StoreEventKind::Created | StoreEventKind::Updated => {
                            if let Some(resource) = ev.resource {
                                if condition.holds(resource.metadata()) {
                                    return Ok(WatchOutcome::satisfied(resource));
                                }
                                last = resource;
                            }
                        }
                        StoreEventKind::Destroyed => {
                            return Ok(WatchOutcome::destroyed(ev.resource.or(Some(last))));
                        }
                        StoreEventKind::Bookmark => {
                            // Lost events; resync from a point read.
                            match self.shared.store.get(rid).await {
                                Ok(resource) => {
                                    if condition.holds(resource.metadata()) {
                                        return Ok(WatchOutcome::satisfied(resource));
                                    }
                                    last = resource;
                                }
                                Err(RuntimeError::NotFound { .. }) => {
                                    return Ok(WatchOutcome::destroyed(Some(last)));
                                }
                                Err(e) => return Err(e),
                            }
                        }
                    }
                }
            }
        }
    }

    /// Creates a resource of a declared output type. The new resource is
    /// owned by the caller and starts in phase `RUNNING` with version `1`.
    pub async fn create(
        &self,
        token: &ControllerToken,
        mut resource: Resource,
    ) -> Result<Resource, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        let rid = resource.resource_id();
        rid.validate()?;
        authorize::output_type(&desc, &rid)?;

        let md = resource.metadata_mut();
        md.owner = desc.name;
        md.phase = Phase::Running;
        self.shared.store.create(resource).await
    }

    /// Replaces the spec (and labels) of an owned resource under optimistic
    /// concurrency.
    ///
    /// During teardown only the owner may still update; everyone else fails
    /// with [`RuntimeError::PhaseConflict`].
    pub async fn update(
        &self,
        token: &ControllerToken,
        current_version: u64,
        resource: Resource,
    ) -> Result<Resource, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        let rid = resource.resource_id();
        rid.validate()?;
        authorize::output_type(&desc, &rid)?;

        let existing = self.shared.store.get(&rid).await?;
        authorize::mutate(&desc, existing.metadata())?;
        lifecycle::check_update(existing.metadata(), &desc.name)?;

        // Identity, ownership and lifecycle state survive the update; the
        // caller only brings spec and labels.
        let (mut md, _) = existing.into_parts();
        let (incoming_md, spec) = resource.into_parts();
        md.labels = incoming_md.labels;
        self.shared
            .store
            .update(current_version, Resource::from_parts(md, spec))
            .await
    }

    /// Announces destruction intent: transitions the resource to
    /// `TEARING_DOWN` and reports whether `Destroy` would succeed now.
    ///
    /// Idempotent: repeated calls on a tearing-down resource only report
    /// readiness.
    pub async fn teardown(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
    ) -> Result<bool, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        rid.validate()?;
        authorize::output_type(&desc, rid)?;

        let existing = self.shared.store.get(rid).await?;
        authorize::mutate(&desc, existing.metadata())?;

        if existing.metadata().phase == Phase::TearingDown {
            return Ok(lifecycle::teardown_ready(existing.metadata()));
        }

        let updated = self
            .shared
            .store
            .update_meta(rid, MetaPatch::phase(Phase::TearingDown))
            .await?;
        Ok(lifecycle::teardown_ready(updated.metadata()))
    }

    /// Removes a tearing-down resource with no finalizers left.
    pub async fn destroy(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
    ) -> Result<(), RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        rid.validate()?;
        authorize::output_type(&desc, rid)?;

        let existing = self.shared.store.get(rid).await?;
        authorize::mutate(&desc, existing.metadata())?;
        lifecycle::check_destroy(existing.metadata())?;
        self.shared.store.destroy(rid).await
    }

    /// Appends finalizers to a resource covered by a strong or destroy-ready
    /// input. Already-present finalizers are skipped without effect.
    pub async fn add_finalizers(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
        finalizers: &[String],
    ) -> Result<Resource, RuntimeError> {
        self.finalizer_patch(token, rid, MetaPatch::add(finalizers), finalizers)
            .await
    }

    /// Removes finalizers from a covered resource. Absent finalizers are
    /// skipped without effect.
    pub async fn remove_finalizers(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
        finalizers: &[String],
    ) -> Result<Resource, RuntimeError> {
        self.finalizer_patch(token, rid, MetaPatch::remove(finalizers), finalizers)
            .await
    }

    async fn finalizer_patch(
        &self,
        token: &ControllerToken,
        rid: &ResourceId,
        patch: MetaPatch,
        finalizers: &[String],
    ) -> Result<Resource, RuntimeError> {
        self.shared.ensure_running()?;
        let desc = self.resolve(token).await?;
        rid.validate()?;
        if finalizers.iter().any(String::is_empty) {
            return Err(RuntimeError::InvalidArgument {
                reason: "finalizer string is empty".into(),
            });
        }
        authorize::finalizers(&desc, rid)?;
        self.shared.store.update_meta(rid, patch).await
    }
}
