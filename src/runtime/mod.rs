//! # Runtime controller.
//!
//! System lifecycle (`CONFIGURING → RUNNING → STOPPED`), component wiring,
//! and in-process hosting of [`Controller`] implementations.

mod actor;
mod controller;
mod core;
pub(crate) mod shared;

pub use actor::ActorExitReason;
pub use controller::{Controller, ReconcileContext};
pub use self::core::{Runtime, RuntimeBuilder};
pub use shared::RuntimeState;
