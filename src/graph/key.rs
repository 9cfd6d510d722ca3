//! # Subscription keys and subscriber records.

use crate::registry::{Input, InputKind};

/// Key of one store watch: `(namespace, type, id?)`.
///
/// Inputs from different controllers with the same key share one watch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionKey {
    pub namespace: String,
    pub ty: String,
    pub id: Option<String>,
}

impl From<&Input> for SubscriptionKey {
    fn from(input: &Input) -> Self {
        Self {
            namespace: input.namespace.clone(),
            ty: input.ty.clone(),
            id: input.id.clone(),
        }
    }
}

/// One `(controller, kind)` pair subscribed under a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Subscriber {
    pub controller: String,
    pub kind: InputKind,
}
