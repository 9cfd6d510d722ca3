//! # Input and output declarations.
//!
//! A controller declares what it reads (inputs: watch subscriptions with a
//! strength) and what it writes (outputs: type-scoped write claims with a
//! sharing mode). Declarations are validated at registration and drive both
//! the dependency graph and the adapter's authorization matrix.

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::resource::{Id, Namespace, ResourceId, ResourceType};

/// Strength of an input subscription.
///
/// Wire values: `WEAK=0, STRONG=1, DESTROY_READY=2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum InputKind {
    /// Observe changes only; may not touch finalizers.
    Weak = 0,
    /// Observe changes and participate in teardown via finalizers.
    Strong = 1,
    /// Receive an event only when a tearing-down resource owned by the
    /// subscriber has no finalizers left (it is ready for `Destroy`).
    DestroyReady = 2,
}

impl InputKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InputKind::Weak => "weak",
            InputKind::Strong => "strong",
            InputKind::DestroyReady => "destroy_ready",
        }
    }

    /// True if this kind authorizes finalizer mutation.
    pub fn allows_finalizers(&self) -> bool {
        matches!(self, InputKind::Strong | InputKind::DestroyReady)
    }
}

/// Sharing mode of an output claim.
///
/// Wire values: `EXCLUSIVE=0, SHARED=1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OutputKind {
    /// Exactly one controller writes this type.
    Exclusive = 0,
    /// Several controllers write this type; each resource is mutable only by
    /// its owner.
    Shared = 1,
}

impl OutputKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OutputKind::Exclusive => "exclusive",
            OutputKind::Shared => "shared",
        }
    }
}

/// Watch subscription declared by a controller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    /// Subscription strength.
    pub kind: InputKind,
    /// Namespace to watch.
    pub namespace: Namespace,
    /// Resource type to watch.
    #[serde(rename = "type")]
    pub ty: ResourceType,
    /// Exact id, or `None` for all ids of that type in the namespace.
    pub id: Option<Id>,
}

impl Input {
    /// Declares an input over all ids of `(namespace, type)`.
    pub fn namespaced(
        kind: InputKind,
        namespace: impl Into<Namespace>,
        ty: impl Into<ResourceType>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            ty: ty.into(),
            id: None,
        }
    }

    /// Declares an input over one exact resource.
    pub fn exact(
        kind: InputKind,
        namespace: impl Into<Namespace>,
        ty: impl Into<ResourceType>,
        id: impl Into<Id>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            ty: ty.into(),
            id: Some(id.into()),
        }
    }

    /// Validates the declaration shape.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.namespace.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "input namespace is empty".into(),
            });
        }
        if self.ty.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "input type is empty".into(),
            });
        }
        if self.id.as_deref() == Some("") {
            return Err(RuntimeError::InvalidArgument {
                reason: "input id is empty".into(),
            });
        }
        Ok(())
    }

    /// True if this input covers the given resource address.
    pub fn covers(&self, rid: &ResourceId) -> bool {
        self.namespace == rid.namespace
            && self.ty == rid.ty
            && self.id.as_deref().is_none_or(|id| id == rid.id)
    }
}

/// Write claim declared by a controller. Outputs are type-scoped and cover
/// all namespaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    /// Resource type this controller writes.
    #[serde(rename = "type")]
    pub ty: ResourceType,
    /// Sharing mode.
    pub kind: OutputKind,
}

impl Output {
    /// Declares an exclusive output.
    pub fn exclusive(ty: impl Into<ResourceType>) -> Self {
        Self {
            ty: ty.into(),
            kind: OutputKind::Exclusive,
        }
    }

    /// Declares a shared output.
    pub fn shared(ty: impl Into<ResourceType>) -> Self {
        Self {
            ty: ty.into(),
            kind: OutputKind::Shared,
        }
    }

    /// Validates the declaration shape.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.ty.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "output type is empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_input_covers_only_its_id() {
        let input = Input::exact(InputKind::Weak, "default", "configs", "x");
        assert!(input.covers(&ResourceId::new("default", "configs", "x")));
        assert!(!input.covers(&ResourceId::new("default", "configs", "y")));
        assert!(!input.covers(&ResourceId::new("other", "configs", "x")));
    }

    #[test]
    fn namespaced_input_covers_all_ids() {
        let input = Input::namespaced(InputKind::Strong, "default", "configs");
        assert!(input.covers(&ResourceId::new("default", "configs", "x")));
        assert!(input.covers(&ResourceId::new("default", "configs", "y")));
        assert!(!input.covers(&ResourceId::new("default", "machines", "x")));
    }

    #[test]
    fn validation_rejects_empty_fields() {
        assert!(Input::namespaced(InputKind::Weak, "", "configs").validate().is_err());
        assert!(Input::namespaced(InputKind::Weak, "default", "").validate().is_err());
        assert!(Input::exact(InputKind::Weak, "default", "configs", "").validate().is_err());
        assert!(Output::exclusive("").validate().is_err());
    }

    #[test]
    fn finalizer_authorization_by_kind() {
        assert!(!InputKind::Weak.allows_finalizers());
        assert!(InputKind::Strong.allows_finalizers());
        assert!(InputKind::DestroyReady.allows_finalizers());
    }
}
