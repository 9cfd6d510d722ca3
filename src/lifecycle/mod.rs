//! # Resource lifecycle gates.
//!
//! The phase/finalizer state machine, expressed as checks the adapter runs
//! before dispatching a mutation to the store:
//!
//! ```text
//!             Create
//!               │
//!               ▼
//!       ┌───────────────┐
//!       │   RUNNING     │◀────── Update / AddFinalizer / RemoveFinalizer
//!       └──────┬────────┘
//!              │ Teardown (by owner)
//!              ▼
//!       ┌───────────────┐
//!       │ TEARING_DOWN  │◀────── RemoveFinalizer (by strong-input holders)
//!       └──────┬────────┘
//!              │ Destroy (by owner, iff finalizers == ∅)
//!              ▼
//!          (destroyed)
//! ```
//!
//! ## Rules
//! - The transition to `TEARING_DOWN` is one-way within a resource lifetime.
//! - During teardown, only the owner may still change the spec (it is
//!   reacting to its own teardown); everyone else gets `PHASE_CONFLICT`.
//! - `Destroy` requires `TEARING_DOWN` and an empty finalizer set.

use crate::error::RuntimeError;
use crate::resource::{Metadata, Phase};

/// Checks that `caller` may replace the spec of a resource in its current
/// phase.
pub(crate) fn check_update(md: &Metadata, caller: &str) -> Result<(), RuntimeError> {
    if md.phase == Phase::TearingDown && md.owner != caller {
        return Err(RuntimeError::PhaseConflict {
            resource: md.resource_id(),
            phase: md.phase,
        });
    }
    Ok(())
}

/// True if `Destroy` would succeed right now.
pub(crate) fn teardown_ready(md: &Metadata) -> bool {
    md.finalizers_empty()
}

/// Checks the `Destroy` preconditions: tearing down, no finalizers.
pub(crate) fn check_destroy(md: &Metadata) -> Result<(), RuntimeError> {
    if md.phase != Phase::TearingDown {
        return Err(RuntimeError::PhaseConflict {
            resource: md.resource_id(),
            phase: md.phase,
        });
    }
    if !md.finalizers_empty() {
        return Err(RuntimeError::HasFinalizers {
            resource: md.resource_id(),
            count: md.finalizers.len(),
        });
    }
    Ok(())
}
