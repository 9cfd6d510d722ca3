//! # Error types used by the controlvisor runtime and hosted controllers.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] errors surfaced by the runtime itself: registration,
//!   authorization, lifecycle and store failures.
//! - [`ControllerError`] errors raised by hosted controller reconcile bodies.
//!
//! Both types provide `as_label` for metrics. [`ControllerError`] has
//! additional methods: `is_retryable()` and `is_fatal()`.

use std::time::Duration;

use thiserror::Error;

use crate::resource::{Phase, ResourceId};

/// # Errors produced by the controlvisor runtime.
///
/// A transport layer maps these one-to-one onto its status codes; the runtime
/// never retries on the caller's behalf.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The supplied controller token does not resolve to any registration.
    #[error("unknown controller token")]
    InvalidToken,

    /// A controller with the same name is already registered.
    #[error("controller '{name}' is already registered")]
    NameConflict {
        /// The duplicate controller name.
        name: String,
    },

    /// An output declaration collides with an existing registration.
    #[error("output type '{ty}' conflicts with registration of controller '{claimed_by}'")]
    OutputConflict {
        /// The contested output type.
        ty: String,
        /// The controller already holding it.
        claimed_by: String,
    },

    /// Operation requires the runtime to still be configuring.
    #[error("runtime already started")]
    RuntimeStarted,

    /// Operation requires the runtime to be running.
    #[error("runtime not started")]
    RuntimeNotStarted,

    /// The runtime has been stopped.
    #[error("runtime stopped")]
    RuntimeStopped,

    /// The resource is not covered by the controller's declarations, or an
    /// ownership rule was violated.
    #[error("controller '{controller}' is not authorized for resource {resource}")]
    NotAuthorizedForResource {
        /// The calling controller.
        controller: String,
        /// The contested resource.
        resource: ResourceId,
    },

    /// The resource does not exist.
    #[error("resource {resource} not found")]
    NotFound {
        /// The missing resource.
        resource: ResourceId,
    },

    /// A resource with the same address already exists.
    #[error("resource {resource} already exists")]
    AlreadyExists {
        /// The duplicate resource.
        resource: ResourceId,
    },

    /// Optimistic concurrency failure: the stored version moved on.
    #[error("resource {resource} version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// The contested resource.
        resource: ResourceId,
        /// Version supplied by the caller.
        expected: u64,
        /// Version currently in the store.
        found: u64,
    },

    /// Destroy attempted while finalizers are still attached.
    #[error("resource {resource} still has {count} finalizer(s)")]
    HasFinalizers {
        /// The contested resource.
        resource: ResourceId,
        /// Number of finalizers still attached.
        count: usize,
    },

    /// The operation is not permitted in the resource's current phase.
    #[error("resource {resource} is in phase '{phase}'")]
    PhaseConflict {
        /// The contested resource.
        resource: ResourceId,
        /// Phase the resource was observed in.
        phase: Phase,
    },

    /// The caller cancelled a streaming or waiting call.
    #[error("operation cancelled")]
    Cancelled,

    /// Malformed identity, unknown enum value, or an empty required field.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was malformed.
        reason: String,
    },

    /// Shutdown grace period exceeded; some hosted controllers remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of controllers that did not exit in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidToken => "invalid_token",
            RuntimeError::NameConflict { .. } => "name_conflict",
            RuntimeError::OutputConflict { .. } => "output_conflict",
            RuntimeError::RuntimeStarted => "runtime_started",
            RuntimeError::RuntimeNotStarted => "runtime_not_started",
            RuntimeError::RuntimeStopped => "runtime_stopped",
            RuntimeError::NotAuthorizedForResource { .. } => "not_authorized_for_resource",
            RuntimeError::NotFound { .. } => "not_found",
            RuntimeError::AlreadyExists { .. } => "already_exists",
            RuntimeError::VersionMismatch { .. } => "version_mismatch",
            RuntimeError::HasFinalizers { .. } => "has_finalizers",
            RuntimeError::PhaseConflict { .. } => "phase_conflict",
            RuntimeError::Cancelled => "cancelled",
            RuntimeError::InvalidArgument { .. } => "invalid_argument",
            RuntimeError::GraceExceeded { .. } => "grace_exceeded",
        }
    }
}

/// # Errors produced by hosted controller reconcile bodies.
///
/// A reconcile attempt either fails transiently (`Fail`, retried with
/// backoff), fails permanently (`Fatal`, the actor exits), or observes
/// cancellation (`Canceled`, intentional termination).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Reconcile failed but may succeed if retried.
    #[error("reconcile failed: {reason}")]
    Fail { reason: String },

    /// Non-recoverable fatal error (the actor will not retry).
    #[error("fatal error (no retry): {reason}")]
    Fatal { reason: String },

    /// Reconcile observed runtime shutdown or stream cancellation.
    ///
    /// This is **not an error** in the traditional sense, but signals
    /// intentional termination.
    #[error("context canceled")]
    Canceled,
}

impl ControllerError {
    /// Transient failure with a reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        ControllerError::Fail {
            reason: reason.into(),
        }
    }

    /// Permanent failure with a reason.
    pub fn fatal(reason: impl Into<String>) -> Self {
        ControllerError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::Fail { .. } => "reconcile_failed",
            ControllerError::Fatal { .. } => "reconcile_fatal",
            ControllerError::Canceled => "reconcile_canceled",
        }
    }

    /// Indicates whether the error type is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ControllerError::Fail { .. })
    }

    /// Indicates whether the error is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ControllerError::Fatal { .. })
    }
}

impl From<RuntimeError> for ControllerError {
    /// Adapter failures inside a reconcile body default to retryable, except
    /// cancellation and shutdown which map to [`ControllerError::Canceled`].
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Cancelled | RuntimeError::RuntimeStopped => ControllerError::Canceled,
            other => ControllerError::Fail {
                reason: other.to_string(),
            },
        }
    }
}
