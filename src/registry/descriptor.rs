//! # Controller descriptors.
//!
//! The registry's record of one registration: name, credential, and the
//! declared input/output sets. The adapter answers every authorization
//! question against a descriptor snapshot.

use crate::resource::ResourceId;

use super::declaration::{Input, Output};
use super::token::ControllerToken;

/// One registered controller.
#[derive(Clone, Debug)]
pub struct ControllerDescriptor {
    /// Globally unique controller name.
    pub name: String,
    /// Credential issued at registration.
    pub token: ControllerToken,
    /// Declared watch subscriptions.
    pub inputs: Vec<Input>,
    /// Declared write claims (fixed at registration).
    pub outputs: Vec<Output>,
}

impl ControllerDescriptor {
    /// The output claim for a resource type, if declared.
    pub fn output_for(&self, ty: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.ty == ty)
    }

    /// The first input covering a resource address, if any.
    pub fn input_covering(&self, rid: &ResourceId) -> Option<&Input> {
        self.inputs.iter().find(|i| i.covers(rid))
    }

    /// A finalizer-capable (strong or destroy-ready) input covering the
    /// address, if any.
    pub fn finalizer_input_covering(&self, rid: &ResourceId) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|i| i.kind.allows_finalizers() && i.covers(rid))
    }

    /// True if the controller may read the address: it is covered by an
    /// input, or the type is one of the controller's outputs (outputs are
    /// type-scoped and cover all namespaces).
    pub fn may_read(&self, rid: &ResourceId) -> bool {
        self.input_covering(rid).is_some() || self.output_for(&rid.ty).is_some()
    }

    /// True if the controller may read from a `(namespace, type)` listing:
    /// any input over that scope qualifies, as does an output of the type.
    pub fn may_list(&self, namespace: &str, ty: &str) -> bool {
        self.inputs
            .iter()
            .any(|i| i.namespace == namespace && i.ty == ty)
            || self.output_for(ty).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InputKind, OutputKind};

    fn descriptor() -> ControllerDescriptor {
        ControllerDescriptor {
            name: "configs-ctrl".into(),
            token: ControllerToken::from("test-token"),
            inputs: vec![
                Input::namespaced(InputKind::Weak, "default", "machines"),
                Input::exact(InputKind::Strong, "default", "disks", "sda"),
            ],
            outputs: vec![Output::exclusive("configs")],
        }
    }

    #[test]
    fn read_covers_inputs_and_outputs() {
        let d = descriptor();
        // Weak input over all machines in "default".
        assert!(d.may_read(&ResourceId::new("default", "machines", "m1")));
        // Exact input covers only its id.
        assert!(d.may_read(&ResourceId::new("default", "disks", "sda")));
        assert!(!d.may_read(&ResourceId::new("default", "disks", "sdb")));
        // Output type readable in any namespace.
        assert!(d.may_read(&ResourceId::new("elsewhere", "configs", "c1")));
        // Undeclared: no.
        assert!(!d.may_read(&ResourceId::new("default", "secrets", "s1")));
    }

    #[test]
    fn finalizer_input_requires_strength() {
        let d = descriptor();
        assert!(d
            .finalizer_input_covering(&ResourceId::new("default", "disks", "sda"))
            .is_some());
        assert!(d
            .finalizer_input_covering(&ResourceId::new("default", "machines", "m1"))
            .is_none());
    }

    #[test]
    fn output_lookup_by_type() {
        let d = descriptor();
        assert_eq!(d.output_for("configs").map(|o| o.kind), Some(OutputKind::Exclusive));
        assert!(d.output_for("machines").is_none());
    }
}
