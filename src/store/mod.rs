//! # Store facade.
//!
//! Narrow capability interface over the resource store, plus the reference
//! in-memory implementation. Authorization and lifecycle rules are layered
//! on top by the [`adapter`](crate::adapter); the store itself only promises
//! per-key linearizability, strictly increasing versions, and an exact watch
//! protocol (snapshot prefix, then live changes, `Bookmark` on lag).

mod core;
mod event;
mod memory;

pub use self::core::{MetaPatch, Store, WatchFilter, WatchStream};
pub use event::{StoreEvent, StoreEventKind};
pub use memory::MemoryStore;
