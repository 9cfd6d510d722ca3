//! # Authorization matrix.
//!
//! Every adapter operation resolves the caller's descriptor and checks it
//! here before touching the store.
//!
//! | Operation                     | Target must be…                          |
//! |-------------------------------|------------------------------------------|
//! | `Get`, `List`, `WatchFor`     | declared as input or output              |
//! | `Create`, `Update`, `Teardown`, `Destroy` | declared as output; for `SHARED`, caller owns the resource |
//! | `AddFinalizer`, `RemoveFinalizer` | covered by a strong or destroy-ready input |

use crate::error::RuntimeError;
use crate::registry::{ControllerDescriptor, OutputKind};
use crate::resource::{Metadata, ResourceId};

fn denied(desc: &ControllerDescriptor, rid: &ResourceId) -> RuntimeError {
    RuntimeError::NotAuthorizedForResource {
        controller: desc.name.clone(),
        resource: rid.clone(),
    }
}

/// Point reads and waits: any covering input or a matching output type.
pub(crate) fn read(desc: &ControllerDescriptor, rid: &ResourceId) -> Result<(), RuntimeError> {
    if desc.may_read(rid) {
        Ok(())
    } else {
        Err(denied(desc, rid))
    }
}

/// Listings: any input over the `(namespace, type)` scope, or a matching
/// output type. Results are additionally filtered per resource by
/// [`read`]-level coverage.
pub(crate) fn list(
    desc: &ControllerDescriptor,
    namespace: &str,
    ty: &str,
) -> Result<(), RuntimeError> {
    if desc.may_list(namespace, ty) {
        Ok(())
    } else {
        Err(denied(desc, &ResourceId::new(namespace, ty, "*")))
    }
}

/// Creation and the type-level half of every mutation: the type must be a
/// declared output. Checked before the existence read so an unauthorized
/// caller cannot probe for resources.
pub(crate) fn output_type(
    desc: &ControllerDescriptor,
    rid: &ResourceId,
) -> Result<OutputKind, RuntimeError> {
    desc.output_for(&rid.ty)
        .map(|o| o.kind)
        .ok_or_else(|| denied(desc, rid))
}

/// Mutation of an existing resource: the type must be a declared output,
/// and for `SHARED` outputs the caller must be the owner.
pub(crate) fn mutate(
    desc: &ControllerDescriptor,
    md: &Metadata,
) -> Result<OutputKind, RuntimeError> {
    let rid = md.resource_id();
    let output = desc.output_for(&rid.ty).ok_or_else(|| denied(desc, &rid))?;
    if output.kind == OutputKind::Shared && md.owner != desc.name {
        return Err(denied(desc, &rid));
    }
    Ok(output.kind)
}

/// Finalizer mutation: a strong or destroy-ready input must cover the
/// resource.
pub(crate) fn finalizers(
    desc: &ControllerDescriptor,
    rid: &ResourceId,
) -> Result<(), RuntimeError> {
    if desc.finalizer_input_covering(rid).is_some() {
        Ok(())
    } else {
        Err(denied(desc, rid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ControllerToken, Input, InputKind, Output};

    fn desc(name: &str, inputs: Vec<Input>, outputs: Vec<Output>) -> ControllerDescriptor {
        ControllerDescriptor {
            name: name.into(),
            token: ControllerToken::from("t"),
            inputs,
            outputs,
        }
    }

    #[test]
    fn weak_input_cannot_mutate() {
        let d = desc(
            "a",
            vec![Input::exact(InputKind::Weak, "default", "configs", "x")],
            vec![],
        );
        let rid = ResourceId::new("default", "configs", "x");

        assert!(read(&d, &rid).is_ok());
        assert!(output_type(&d, &rid).is_err());
        assert!(finalizers(&d, &rid).is_err());
    }

    #[test]
    fn shared_mutation_requires_ownership() {
        let d = desc("a", vec![], vec![Output::shared("configs")]);

        let mut md = Metadata::new("default", "configs", "x");
        md.owner = "a".to_string();
        assert!(mutate(&d, &md).is_ok());

        md.owner = "b".to_string();
        let err = mutate(&d, &md).unwrap_err();
        assert_eq!(err.as_label(), "not_authorized_for_resource");
    }

    #[test]
    fn exclusive_mutation_needs_no_ownership_check() {
        let d = desc("a", vec![], vec![Output::exclusive("configs")]);
        let md = Metadata::new("default", "configs", "x");
        assert!(mutate(&d, &md).is_ok());
    }

    #[test]
    fn destroy_ready_input_allows_finalizers() {
        let d = desc(
            "a",
            vec![Input::namespaced(InputKind::DestroyReady, "default", "configs")],
            vec![],
        );
        assert!(finalizers(&d, &ResourceId::new("default", "configs", "x")).is_ok());
    }
}
