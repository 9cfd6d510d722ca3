//! # Resource data model.
//!
//! Identity, metadata and opaque payloads: the vocabulary shared by the
//! store, the registry and the adapter.
//!
//! ## Contents
//! - [`ResourceId`] and the `Namespace`/`ResourceType`/`Id` aliases
//! - [`Metadata`], [`Phase`], [`LabelQuery`] the interpreted half of a resource
//! - [`Spec`] the opaque half
//! - [`Resource`] the pair

mod core;
mod id;
mod metadata;
mod spec;

pub use self::core::Resource;
pub use id::{Id, Namespace, ResourceId, ResourceType};
pub use metadata::{LabelQuery, LabelTerm, Metadata, Phase};
pub use spec::Spec;
