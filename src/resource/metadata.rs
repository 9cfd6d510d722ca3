//! # Resource metadata: version, ownership, phase, finalizers, labels.
//!
//! Metadata is the mutable half of a resource that the runtime *does*
//! interpret (the spec payload is opaque). The store assigns `version`,
//! `created` and `updated`; everything else is governed by the adapter's
//! authorization rules.
//!
//! ## Rules
//! - Identity (`namespace`, `type`, `id`) is immutable after creation.
//! - `version` strictly increases with every spec-or-metadata change.
//! - `phase` moves one way: `RUNNING → TEARING_DOWN`.
//! - `finalizers` is an ordered set: uniqueness by value, insertion order
//!   observable but not semantically significant.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::id::{Id, Namespace, ResourceId, ResourceType};

/// Lifecycle phase of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Normal operation; the resource may be freely updated by its owner.
    Running,
    /// Destruction intent announced; waiting for finalizers to clear.
    TearingDown,
}

impl Phase {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::TearingDown => "tearing_down",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Mutable metadata block attached to every resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Namespace the resource lives in (immutable).
    pub namespace: Namespace,
    /// Canonical type name (immutable).
    #[serde(rename = "type")]
    pub ty: ResourceType,
    /// Identifier within `(namespace, type)` (immutable).
    pub id: Id,
    /// Optimistic-concurrency token, assigned by the store. `0` means the
    /// resource has not been persisted yet.
    pub version: u64,
    /// Name of the controller that created the resource; empty if unowned.
    pub owner: String,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Ordered set of opaque finalizer strings.
    pub finalizers: Vec<String>,
    /// Free-form labels, queryable via [`LabelQuery`](crate::resource::LabelQuery).
    pub labels: BTreeMap<String, String>,
    /// Creation timestamp, set by the store.
    pub created: SystemTime,
    /// Last-change timestamp, set by the store.
    pub updated: SystemTime,
}

impl Metadata {
    /// Creates metadata for a not-yet-persisted resource.
    pub fn new(
        namespace: impl Into<Namespace>,
        ty: impl Into<ResourceType>,
        id: impl Into<Id>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            namespace: namespace.into(),
            ty: ty.into(),
            id: id.into(),
            version: 0,
            owner: String::new(),
            phase: Phase::Running,
            finalizers: Vec::new(),
            labels: BTreeMap::new(),
            created: now,
            updated: now,
        }
    }

    /// Returns the fully-qualified address of this resource.
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.ty.clone(), self.id.clone())
    }

    /// True if no finalizer is attached.
    pub fn finalizers_empty(&self) -> bool {
        self.finalizers.is_empty()
    }

    /// True if the given finalizer is present.
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Adds a finalizer; returns `false` if it was already present (no-op).
    pub fn add_finalizer(&mut self, finalizer: impl Into<String>) -> bool {
        let finalizer = finalizer.into();
        if self.has_finalizer(&finalizer) {
            return false;
        }
        self.finalizers.push(finalizer);
        true
    }

    /// Removes a finalizer; returns `false` if it was absent (no-op).
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        self.finalizers.len() != before
    }

    /// Sets a label, replacing any previous value.
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }
}

/// Single term of a label query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelTerm {
    /// The label key must be present, with any value.
    Exists(String),
    /// The label key must be present with exactly this value.
    Equal(String, String),
}

impl LabelTerm {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            LabelTerm::Exists(key) => labels.contains_key(key),
            LabelTerm::Equal(key, value) => labels.get(key).is_some_and(|v| v == value),
        }
    }
}

/// Conjunction of label terms; an empty query matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelQuery {
    /// Terms, all of which must match.
    pub terms: Vec<LabelTerm>,
}

impl LabelQuery {
    /// Query matching every resource.
    pub fn any() -> Self {
        Self::default()
    }

    /// Adds an `exists` term.
    pub fn exists(mut self, key: impl Into<String>) -> Self {
        self.terms.push(LabelTerm::Exists(key.into()));
        self
    }

    /// Adds an `equal` term.
    pub fn equal(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push(LabelTerm::Equal(key.into(), value.into()));
        self
    }

    /// True if every term matches the given metadata.
    pub fn matches(&self, md: &Metadata) -> bool {
        self.terms.iter().all(|t| t.matches(&md.labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_finalizer_is_idempotent() {
        let mut md = Metadata::new("default", "configs", "x");
        assert!(md.add_finalizer("cleanup"));
        assert!(!md.add_finalizer("cleanup"));
        assert_eq!(md.finalizers, vec!["cleanup".to_string()]);
    }

    #[test]
    fn remove_finalizer_reports_absence() {
        let mut md = Metadata::new("default", "configs", "x");
        md.add_finalizer("a");
        md.add_finalizer("b");
        assert!(md.remove_finalizer("a"));
        assert!(!md.remove_finalizer("a"));
        assert_eq!(md.finalizers, vec!["b".to_string()]);
    }

    #[test]
    fn label_query_conjunction() {
        let mut md = Metadata::new("default", "configs", "x");
        md.set_label("tier", "web");
        md.set_label("zone", "a");

        assert!(LabelQuery::any().matches(&md));
        assert!(LabelQuery::any().exists("tier").matches(&md));
        assert!(LabelQuery::any().equal("tier", "web").exists("zone").matches(&md));
        assert!(!LabelQuery::any().equal("tier", "db").matches(&md));
        assert!(!LabelQuery::any().exists("missing").matches(&md));
    }
}
