//! # Store change events.
//!
//! Every successful mutation publishes one event on the store's change feed.
//! Watch streams prefix the live feed with a synthesized `Created` event per
//! extant match (the initial snapshot), and inject `Bookmark` when a receiver
//! lagged and must resync by re-reading.

use crate::resource::{Metadata, Resource};

/// Kind of store change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEventKind {
    /// Resource was created (also synthesized for the initial snapshot).
    Created,
    /// Resource spec or metadata changed.
    Updated,
    /// Resource was removed; the event carries its last state.
    Destroyed,
    /// Events were lost on this stream; consumers must re-read state.
    Bookmark,
}

/// A single change observed on a watch stream.
#[derive(Clone, Debug)]
pub struct StoreEvent {
    /// What happened.
    pub kind: StoreEventKind,
    /// The resource after the change (`Destroyed`: its last state;
    /// `Bookmark`: absent).
    pub resource: Option<Resource>,
}

impl StoreEvent {
    /// A creation event (live or synthesized snapshot entry).
    pub fn created(resource: Resource) -> Self {
        Self {
            kind: StoreEventKind::Created,
            resource: Some(resource),
        }
    }

    /// An update event.
    pub fn updated(resource: Resource) -> Self {
        Self {
            kind: StoreEventKind::Updated,
            resource: Some(resource),
        }
    }

    /// A destruction event carrying the last observed state.
    pub fn destroyed(resource: Resource) -> Self {
        Self {
            kind: StoreEventKind::Destroyed,
            resource: Some(resource),
        }
    }

    /// A resync marker for lagged receivers.
    pub fn bookmark() -> Self {
        Self {
            kind: StoreEventKind::Bookmark,
            resource: None,
        }
    }

    /// Metadata of the carried resource, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.resource.as_ref().map(Resource::metadata)
    }
}
