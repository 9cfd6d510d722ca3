//! # Store capability interface.
//!
//! The runtime consumes a narrow capability set from the resource store:
//! point reads, snapshot listings, watch streams, create/update with
//! optimistic concurrency, metadata patches and unconditional destroy.
//! Authorization and lifecycle rules live **above** this interface, in the
//! adapter; a store implementation only guarantees per-key linearizability
//! and strictly increasing versions.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::RuntimeError;
use crate::resource::{LabelQuery, Phase, Resource, ResourceId};

use super::event::{StoreEvent, StoreEventKind};

/// Atomic metadata patch applied by [`Store::update_meta`].
///
/// Finalizer semantics are set-like: adding a present finalizer and removing
/// an absent one are no-ops. If the patch changes nothing, the store performs
/// no version bump and publishes no event.
#[derive(Clone, Debug, Default)]
pub struct MetaPatch {
    /// Phase to transition to, if any.
    pub phase: Option<Phase>,
    /// Finalizers to append (uniqueness by value).
    pub add_finalizers: Vec<String>,
    /// Finalizers to remove.
    pub remove_finalizers: Vec<String>,
}

impl MetaPatch {
    /// A patch transitioning the resource to the given phase.
    pub fn phase(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    /// A patch appending the given finalizers.
    pub fn add(finalizers: &[String]) -> Self {
        Self {
            add_finalizers: finalizers.to_vec(),
            ..Self::default()
        }
    }

    /// A patch removing the given finalizers.
    pub fn remove(finalizers: &[String]) -> Self {
        Self {
            remove_finalizers: finalizers.to_vec(),
            ..Self::default()
        }
    }
}

/// Filter for a watch subscription: `(namespace, type, id?)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchFilter {
    /// Namespace to watch.
    pub namespace: String,
    /// Resource type to watch.
    pub ty: String,
    /// Exact id, or `None` for all ids of that type in the namespace.
    pub id: Option<String>,
}

impl WatchFilter {
    /// True if the event concerns a matching resource. `Bookmark` events
    /// match every filter (all consumers must resync).
    pub fn matches(&self, ev: &StoreEvent) -> bool {
        if ev.kind == StoreEventKind::Bookmark {
            return true;
        }
        let Some(md) = ev.metadata() else {
            return false;
        };
        md.namespace == self.namespace
            && md.ty == self.ty
            && self.id.as_deref().is_none_or(|id| md.id == id)
    }
}

/// A watch stream: a snapshot prefix of synthesized `Created` events followed
/// by live, filtered change events.
///
/// Broadcast lag is surfaced as a `Bookmark` event instead of an error, so
/// consumers keep the stream and re-read state.
pub struct WatchStream {
    pending: VecDeque<StoreEvent>,
    rx: broadcast::Receiver<StoreEvent>,
    filter: WatchFilter,
}

impl WatchStream {
    /// Assembles a stream from a snapshot and a live receiver.
    ///
    /// The snapshot must be taken under the same critical section as the
    /// `subscribe` call, otherwise events can be duplicated or lost between
    /// the prefix and the live feed.
    pub fn new(
        snapshot: Vec<Resource>,
        rx: broadcast::Receiver<StoreEvent>,
        filter: WatchFilter,
    ) -> Self {
        Self {
            pending: snapshot.into_iter().map(StoreEvent::created).collect(),
            rx,
            filter,
        }
    }

    /// Next event, or `None` once the store's feed is closed.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        loop {
            if let Some(ev) = self.pending.pop_front() {
                return Some(ev);
            }
            match self.rx.recv().await {
                Ok(ev) if self.filter.matches(&ev) => return Some(ev),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    return Some(StoreEvent::bookmark());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Capability set the runtime consumes from the external resource store.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Point read. Fails with [`RuntimeError::NotFound`] if absent.
    async fn get(&self, rid: &ResourceId) -> Result<Resource, RuntimeError>;

    /// Finite snapshot of all resources of `(namespace, type)` matching the
    /// label query, in deterministic id order.
    async fn list(
        &self,
        namespace: &str,
        ty: &str,
        query: &LabelQuery,
    ) -> Result<Vec<Resource>, RuntimeError>;

    /// Opens a watch: synthesized `Created` per extant match, then live
    /// changes.
    async fn watch(
        &self,
        namespace: &str,
        ty: &str,
        id: Option<&str>,
    ) -> Result<WatchStream, RuntimeError>;

    /// Persists a new resource, assigning version `1` and timestamps.
    /// Fails with [`RuntimeError::AlreadyExists`] if the address is taken.
    async fn create(&self, resource: Resource) -> Result<Resource, RuntimeError>;

    /// Compare-and-swap replacement of an existing resource. Fails with
    /// [`RuntimeError::VersionMismatch`] unless `current_version` equals the
    /// stored version; on success the version is bumped and returned.
    async fn update(
        &self,
        current_version: u64,
        resource: Resource,
    ) -> Result<Resource, RuntimeError>;

    /// Applies a metadata patch atomically, bumping the version iff the
    /// patch changed anything.
    async fn update_meta(
        &self,
        rid: &ResourceId,
        patch: MetaPatch,
    ) -> Result<Resource, RuntimeError>;

    /// Removes the resource unconditionally (authorization is done above).
    async fn destroy(&self, rid: &ResourceId) -> Result<(), RuntimeError>;
}
