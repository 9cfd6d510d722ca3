//! # Controller registry.
//!
//! Holds controller descriptors, rejects conflicting registrations, issues
//! tokens, and computes input-set deltas for the dependency graph.
//!
//! ## Rules
//! - Names are globally unique (`NAME_CONFLICT` otherwise).
//! - Output exclusivity: a type declared `EXCLUSIVE` by anyone may not be
//!   declared by any other controller, in any mode (`OUTPUT_CONFLICT`).
//! - Mutation happens under a write lock; readers get cloned snapshots.
//! - Token resolution compares every candidate in constant time.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::RuntimeError;

use super::declaration::{Input, Output, OutputKind};
use super::descriptor::ControllerDescriptor;
use super::token::ControllerToken;

/// Input-set change produced by [`Registry::update_inputs`], consumed by the
/// watch multiplexer to adjust subscriptions.
#[derive(Clone, Debug)]
pub struct InputsDelta {
    /// The controller whose inputs changed.
    pub controller: String,
    /// Declarations present in the new set but not the old.
    pub added: Vec<Input>,
    /// Declarations present in the old set but not the new.
    pub removed: Vec<Input>,
}

/// Lock-guarded table of controller registrations.
pub struct Registry {
    controllers: RwLock<HashMap<String, ControllerDescriptor>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            controllers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a controller and issues its token.
    ///
    /// Validates every declaration, then checks name and output conflicts
    /// against all existing registrations under one write lock, so two
    /// concurrent conflicting registrations cannot both succeed.
    pub async fn register(
        &self,
        name: &str,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
    ) -> Result<ControllerToken, RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::InvalidArgument {
                reason: "controller name is empty".into(),
            });
        }
        for input in &inputs {
            input.validate()?;
        }
        for output in &outputs {
            output.validate()?;
        }
        for (i, output) in outputs.iter().enumerate() {
            if outputs[..i].iter().any(|o| o.ty == output.ty) {
                return Err(RuntimeError::InvalidArgument {
                    reason: format!("output type '{}' declared twice", output.ty),
                });
            }
        }

        let mut controllers = self.controllers.write().await;
        if controllers.contains_key(name) {
            return Err(RuntimeError::NameConflict {
                name: name.to_string(),
            });
        }
        for output in &outputs {
            for existing in controllers.values() {
                if let Some(held) = existing.output_for(&output.ty) {
                    // Shared+shared is the only tolerated overlap.
                    if output.kind == OutputKind::Exclusive || held.kind == OutputKind::Exclusive {
                        return Err(RuntimeError::OutputConflict {
                            ty: output.ty.clone(),
                            claimed_by: existing.name.clone(),
                        });
                    }
                }
            }
        }

        let token = ControllerToken::generate();
        controllers.insert(
            name.to_string(),
            ControllerDescriptor {
                name: name.to_string(),
                token: token.clone(),
                inputs,
                outputs,
            },
        );
        Ok(token)
    }

    /// Resolves a token to a descriptor snapshot.
    ///
    /// Every stored token is compared in constant time; the scan does not
    /// short-circuit on name or length.
    pub async fn resolve(&self, token: &ControllerToken) -> Result<ControllerDescriptor, RuntimeError> {
        let controllers = self.controllers.read().await;
        let mut found = None;
        for descriptor in controllers.values() {
            if descriptor.token.ct_eq(token) {
                found = Some(descriptor.clone());
            }
        }
        found.ok_or(RuntimeError::InvalidToken)
    }

    /// Atomically replaces a controller's input set, returning the delta for
    /// the dependency graph.
    pub async fn update_inputs(
        &self,
        token: &ControllerToken,
        inputs: Vec<Input>,
    ) -> Result<InputsDelta, RuntimeError> {
        for input in &inputs {
            input.validate()?;
        }

        let mut controllers = self.controllers.write().await;
        let descriptor = controllers
            .values_mut()
            .find(|d| d.token.ct_eq(token))
            .ok_or(RuntimeError::InvalidToken)?;

        let added = inputs
            .iter()
            .filter(|i| !descriptor.inputs.contains(i))
            .cloned()
            .collect();
        let removed = descriptor
            .inputs
            .iter()
            .filter(|i| !inputs.contains(i))
            .cloned()
            .collect();

        descriptor.inputs = inputs;
        Ok(InputsDelta {
            controller: descriptor.name.clone(),
            added,
            removed,
        })
    }

    /// Snapshot of all registrations (used to activate the graph at start).
    pub async fn snapshot(&self) -> Vec<ControllerDescriptor> {
        self.controllers.read().await.values().cloned().collect()
    }

    /// Names of all registered controllers.
    pub async fn names(&self) -> Vec<String> {
        let controllers = self.controllers.read().await;
        let mut names: Vec<String> = controllers.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
