//! # In-memory resource store.
//!
//! [`MemoryStore`] is the reference [`Store`] implementation: a lock-guarded
//! map with per-key compare-and-swap versioning and a broadcast change feed.
//!
//! ## Rules
//! - Versions start at `1` on create and increase by `1` on every effective
//!   change; `created` is preserved across updates, `updated` is refreshed.
//! - Change events are published **while the write lock is held**, so the
//!   feed order equals the mutation order and watch snapshots are exact
//!   (no gap, no duplicate, between snapshot prefix and live feed).
//! - No-op metadata patches neither bump the version nor publish an event.

use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::RuntimeError;
use crate::events::Bus;
use crate::resource::{LabelQuery, Resource, ResourceId};

use super::core::{MetaPatch, Store, WatchFilter, WatchStream};
use super::event::StoreEvent;

/// Default capacity of the change feed.
const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Lock-guarded in-memory store with a broadcast change feed.
pub struct MemoryStore {
    inner: RwLock<HashMap<ResourceId, Resource>>,
    feed: Bus<StoreEvent>,
}

impl MemoryStore {
    /// Creates an empty store with the default feed capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Creates an empty store with the given change-feed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            feed: Bus::new(capacity),
        }
    }

    fn validate_scope(namespace: &str, ty: &str) -> Result<(), RuntimeError> {
        if namespace.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "namespace is empty".into(),
            });
        }
        if ty.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "type is empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, rid: &ResourceId) -> Result<Resource, RuntimeError> {
        rid.validate()?;
        let inner = self.inner.read().await;
        inner
            .get(rid)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound {
                resource: rid.clone(),
            })
    }

    async fn list(
        &self,
        namespace: &str,
        ty: &str,
        query: &LabelQuery,
    ) -> Result<Vec<Resource>, RuntimeError> {
        Self::validate_scope(namespace, ty)?;
        let inner = self.inner.read().await;
        let mut out: Vec<Resource> = inner
            .values()
            .filter(|r| {
                let md = r.metadata();
                md.namespace == namespace && md.ty == ty && query.matches(md)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.metadata().id.cmp(&b.metadata().id));
        Ok(out)
    }

    async fn watch(
        &self,
        namespace: &str,
        ty: &str,
        id: Option<&str>,
    ) -> Result<WatchStream, RuntimeError> {
        Self::validate_scope(namespace, ty)?;
        let filter = WatchFilter {
            namespace: namespace.to_string(),
            ty: ty.to_string(),
            id: id.map(str::to_string),
        };

        // Subscribe and snapshot under the same read guard: every event
        // published later comes from a write that happened after this
        // snapshot, so prefix + live feed is exact.
        let inner = self.inner.read().await;
        let rx = self.feed.subscribe();
        let mut snapshot: Vec<Resource> = inner
            .values()
            .filter(|r| {
                let md = r.metadata();
                md.namespace == filter.namespace
                    && md.ty == filter.ty
                    && filter.id.as_deref().is_none_or(|id| md.id == id)
            })
            .cloned()
            .collect();
        drop(inner);

        snapshot.sort_by(|a, b| a.metadata().id.cmp(&b.metadata().id));
        Ok(WatchStream::new(snapshot, rx, filter))
    }

    async fn create(&self, mut resource: Resource) -> Result<Resource, RuntimeError> {
        let rid = resource.resource_id();
        rid.validate()?;

        let mut inner = self.inner.write().await;
        if inner.contains_key(&rid) {
            return Err(RuntimeError::AlreadyExists { resource: rid });
        }

        let now = SystemTime::now();
        let md = resource.metadata_mut();
        md.version = 1;
        md.created = now;
        md.updated = now;

        inner.insert(rid, resource.clone());
        self.feed.publish(StoreEvent::created(resource.clone()));
        Ok(resource)
    }

    async fn update(
        &self,
        current_version: u64,
        mut resource: Resource,
    ) -> Result<Resource, RuntimeError> {
        let rid = resource.resource_id();
        rid.validate()?;

        let mut inner = self.inner.write().await;
        let existing = inner.get(&rid).ok_or_else(|| RuntimeError::NotFound {
            resource: rid.clone(),
        })?;

        let found = existing.metadata().version;
        if found != current_version {
            return Err(RuntimeError::VersionMismatch {
                resource: rid,
                expected: current_version,
                found,
            });
        }

        let created = existing.metadata().created;
        let md = resource.metadata_mut();
        md.version = found + 1;
        md.created = created;
        md.updated = SystemTime::now();

        inner.insert(rid, resource.clone());
        self.feed.publish(StoreEvent::updated(resource.clone()));
        Ok(resource)
    }

    async fn update_meta(
        &self,
        rid: &ResourceId,
        patch: MetaPatch,
    ) -> Result<Resource, RuntimeError> {
        rid.validate()?;

        let mut inner = self.inner.write().await;
        let resource = inner.get_mut(rid).ok_or_else(|| RuntimeError::NotFound {
            resource: rid.clone(),
        })?;

        let md = resource.metadata_mut();
        let mut changed = false;
        if let Some(phase) = patch.phase {
            if md.phase != phase {
                md.phase = phase;
                changed = true;
            }
        }
        for f in &patch.add_finalizers {
            changed |= md.add_finalizer(f.clone());
        }
        for f in &patch.remove_finalizers {
            changed |= md.remove_finalizer(f);
        }

        if changed {
            md.version += 1;
            md.updated = SystemTime::now();
            let updated = resource.clone();
            self.feed.publish(StoreEvent::updated(updated.clone()));
            Ok(updated)
        } else {
            Ok(resource.clone())
        }
    }

    async fn destroy(&self, rid: &ResourceId) -> Result<(), RuntimeError> {
        rid.validate()?;

        let mut inner = self.inner.write().await;
        let last = inner.remove(rid).ok_or_else(|| RuntimeError::NotFound {
            resource: rid.clone(),
        })?;
        self.feed.publish(StoreEvent::destroyed(last));
        Ok(())
    }
}
