//! # Resource identity.
//!
//! Every resource is addressed by the triple `(namespace, type, id)`.
//! Identity is immutable after creation; the aliases below keep signatures
//! readable without introducing newtype friction at the API surface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

/// Namespace a resource lives in.
pub type Namespace = String;

/// Canonical resource type name.
pub type ResourceType = String;

/// Resource identifier, unique within `(namespace, type)`.
pub type Id = String;

/// Fully-qualified resource address.
///
/// Used as the key of the store and of watch subscriptions. Ordering is
/// lexicographic over `(namespace, type, id)` which gives deterministic
/// listings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    /// Namespace the resource lives in.
    pub namespace: Namespace,
    /// Canonical type name.
    #[serde(rename = "type")]
    pub ty: ResourceType,
    /// Identifier within `(namespace, type)`.
    pub id: Id,
}

impl ResourceId {
    /// Creates a new address from its parts.
    pub fn new(
        namespace: impl Into<Namespace>,
        ty: impl Into<ResourceType>,
        id: impl Into<Id>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            ty: ty.into(),
            id: id.into(),
        }
    }

    /// Validates that no identity component is empty.
    ///
    /// The store and the adapter both reject malformed addresses up front so
    /// that an empty field can never alias another key.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.namespace.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "resource namespace is empty".into(),
            });
        }
        if self.ty.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "resource type is empty".into(),
            });
        }
        if self.id.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "resource id is empty".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.ty, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_components() {
        assert!(ResourceId::new("default", "configs", "x").validate().is_ok());
        assert!(ResourceId::new("", "configs", "x").validate().is_err());
        assert!(ResourceId::new("default", "", "x").validate().is_err());
        assert!(ResourceId::new("default", "configs", "").validate().is_err());
    }

    #[test]
    fn display_is_slash_separated() {
        let rid = ResourceId::new("default", "configs", "x");
        assert_eq!(rid.to_string(), "default/configs/x");
    }
}
