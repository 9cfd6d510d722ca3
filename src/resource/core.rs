//! # Resource: metadata plus an opaque spec payload.

use super::id::{Id, Namespace, ResourceId, ResourceType};
use super::metadata::Metadata;
use super::spec::Spec;

/// The atomic unit of state held in the store.
///
/// A resource is its [`Metadata`] (which the runtime interprets) and its
/// [`Spec`] payload (which it does not). Cloning a resource clones the
/// canonical payload bytes, so clones never share mutable state.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    md: Metadata,
    spec: Spec,
}

impl Resource {
    /// Creates a not-yet-persisted resource with default metadata.
    pub fn new(
        namespace: impl Into<Namespace>,
        ty: impl Into<ResourceType>,
        id: impl Into<Id>,
        spec: impl Into<Spec>,
    ) -> Self {
        Self {
            md: Metadata::new(namespace, ty, id),
            spec: spec.into(),
        }
    }

    /// Assembles a resource from existing parts.
    pub fn from_parts(md: Metadata, spec: Spec) -> Self {
        Self { md, spec }
    }

    /// Read access to the metadata block.
    pub fn metadata(&self) -> &Metadata {
        &self.md
    }

    /// Mutable access to the metadata block.
    ///
    /// Exposed for constructing resources before `Create`; once persisted,
    /// metadata mutation goes through the store so versions stay consistent.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.md
    }

    /// The opaque spec payload.
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// Replaces the spec payload, returning the previous one.
    pub fn set_spec(&mut self, spec: impl Into<Spec>) -> Spec {
        std::mem::replace(&mut self.spec, spec.into())
    }

    /// The fully-qualified address of this resource.
    pub fn resource_id(&self) -> ResourceId {
        self.md.resource_id()
    }

    /// Splits the resource into its parts.
    pub fn into_parts(self) -> (Metadata, Spec) {
        (self.md, self.spec)
    }
}
