//! # controlvisor
//!
//! **Controlvisor** is a controller supervision and reconciliation runtime.
//!
//! It hosts a collection of *controllers*, each of which reconciles a set of
//! *input* resources into a set of *output* resources held in a shared,
//! versioned resource store. The runtime guarantees that every controller
//! observes a consistent view, converges to a fixed point, and cooperates on
//! resource ownership and lifecycle.
//!
//! ## Features
//!
//! | Area               | Description                                                        | Key types / traits                       |
//! |--------------------|--------------------------------------------------------------------|------------------------------------------|
//! | **Registry**       | Controller registration, conflict detection, token issuance.       | [`Input`], [`Output`], [`ControllerToken`] |
//! | **Store facade**   | Versioned resource store capability set, in-memory reference impl. | [`Store`], [`MemoryStore`]               |
//! | **Event routing**  | Watch multiplexing and coalescing reconcile mailboxes.             | [`ReconcileStream`]                      |
//! | **Adapter**        | Token-scoped operations enforcing the authorization matrix.        | [`Adapter`]                              |
//! | **Lifecycle**      | Teardown/finalizer/destroy state machine.                          | [`Phase`], [`Condition`]                 |
//! | **Hosting**        | In-process controllers with restart policies and backoff.          | [`Controller`], [`ReconcileContext`]     |
//! | **Errors**         | Typed errors for runtime and reconcile failures.                   | [`RuntimeError`], [`ControllerError`]    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`](subscribers::LogWriter)
//!   subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use controlvisor::{Config, Output, Resource, Runtime};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = Runtime::new(Config::default());
//!
//!     // Register an external controller owning the "configs" type.
//!     let token = runtime
//!         .register_controller("configs-ctrl", vec![], vec![Output::exclusive("configs")])
//!         .await?;
//!
//!     runtime.start().await?;
//!     let adapter = runtime.adapter();
//!
//!     // Reconcile loop: wait for a signal, then converge.
//!     let mut stream = adapter.reconcile_events(&token).await?;
//!     if stream.next().await.is_some() {
//!         let created = adapter
//!             .create(&token, Resource::new("default", "configs", "x", "v1"))
//!             .await?;
//!         assert_eq!(created.metadata().version, 1);
//!     }
//!
//!     drop(stream);
//!     runtime.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod events;
pub mod policies;
pub mod registry;
pub mod resource;
pub mod runtime;
pub mod store;
pub mod subscribers;

mod config;
mod error;
mod graph;
mod lifecycle;
mod mailbox;

// ---- Public re-exports ----

pub use adapter::{Adapter, Condition, ReconcileEvent, ReconcileStream, WatchOutcome};
pub use config::Config;
pub use error::{ControllerError, RuntimeError};
pub use policies::{BackoffPolicy, Jitter, RestartPolicy};
pub use registry::{
    ControllerDescriptor, ControllerToken, Input, InputKind, Output, OutputKind,
};
pub use resource::{LabelQuery, LabelTerm, Metadata, Phase, Resource, ResourceId, Spec};
pub use runtime::{Controller, ReconcileContext, Runtime, RuntimeBuilder, RuntimeState};
pub use store::{MemoryStore, MetaPatch, Store, StoreEvent, StoreEventKind};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
pub use subscribers::{Subscribe, SubscriberSet};
