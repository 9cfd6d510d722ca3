//! # Opaque spec payloads.
//!
//! The runtime never interprets resource specs: a [`Spec`] is a canonical
//! byte sequence in a self-describing textual serialization, stored and
//! passed through verbatim. Helpers are provided for controllers that want
//! to round-trip typed values through JSON, but nothing in the runtime
//! depends on them.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RuntimeError;

/// Opaque resource payload, held as canonical bytes.
///
/// Equality is byte equality: the store keeps the canonical representation,
/// never a live object graph, so deep-copy semantics follow from cloning the
/// buffer.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Spec {
    raw: Vec<u8>,
}

impl Spec {
    /// Wraps raw payload bytes.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    /// The empty payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serializes a typed value into a canonical JSON payload.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, RuntimeError> {
        let raw = serde_json::to_vec(value).map_err(|e| RuntimeError::InvalidArgument {
            reason: format!("spec serialization failed: {e}"),
        })?;
        Ok(Self { raw })
    }

    /// Decodes the payload as a typed JSON value.
    pub fn to_value<T: DeserializeOwned>(&self) -> Result<T, RuntimeError> {
        serde_json::from_slice(&self.raw).map_err(|e| RuntimeError::InvalidArgument {
            reason: format!("spec deserialization failed: {e}"),
        })
    }

    /// Raw payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl From<&str> for Spec {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<String> for Spec {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads are self-describing text; show them as such.
        write!(f, "Spec({:?})", String::from_utf8_lossy(&self.raw))
    }
}
