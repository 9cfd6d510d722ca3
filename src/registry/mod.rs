//! # Controller registry.
//!
//! Registration, conflict detection, and token issuance.
//!
//! ## Contents
//! - [`Input`], [`Output`], [`InputKind`], [`OutputKind`] declarations
//! - [`ControllerToken`] opaque credentials (constant-time comparison)
//! - [`ControllerDescriptor`] one registration record
//! - [`Registry`] the lock-guarded table, with [`InputsDelta`] for the graph

mod core;
mod declaration;
mod descriptor;
mod token;

pub use self::core::{InputsDelta, Registry};
pub use declaration::{Input, InputKind, Output, OutputKind};
pub use descriptor::ControllerDescriptor;
pub use token::ControllerToken;
