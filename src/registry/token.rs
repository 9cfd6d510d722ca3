//! # Controller tokens.
//!
//! A token is the opaque, unguessable handle a controller presents on every
//! adapter call. 256 bits of entropy, hex-encoded.
//!
//! ## Rules
//! - Comparison is constant-time (timing side channels leak nothing).
//! - `Debug` output is redacted; tokens never appear in logs in plaintext.
//! - [`ControllerToken::reveal`] is the only way to read the raw value, for
//!   handing it to a transport.

use std::fmt;
use std::fmt::Write as _;

use rand::Rng;
use subtle::ConstantTimeEq;

/// Number of random bytes in a token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Opaque controller credential.
#[derive(Clone)]
pub struct ControllerToken(String);

impl ControllerToken {
    /// Generates a fresh token from the thread-local CSPRNG.
    pub(crate) fn generate() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
        let mut out = String::with_capacity(TOKEN_BYTES * 2);
        for b in bytes {
            // Infallible: writing to a String cannot fail.
            let _ = write!(out, "{b:02x}");
        }
        Self(out)
    }

    /// Constant-time equality against another token.
    pub fn ct_eq(&self, other: &ControllerToken) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    /// Exposes the raw token value for transport handoff.
    ///
    /// Callers must not log or persist the returned string.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl From<String> for ControllerToken {
    /// Reconstructs a token received from a transport.
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ControllerToken {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl PartialEq for ControllerToken {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other)
    }
}

impl Eq for ControllerToken {}

impl fmt::Debug for ControllerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ControllerToken(redacted)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_long() {
        let a = ControllerToken::generate();
        let b = ControllerToken::generate();
        assert_eq!(a.reveal().len(), TOKEN_BYTES * 2);
        assert!(!a.ct_eq(&b));
        assert!(a.ct_eq(&a.clone()));
    }

    #[test]
    fn debug_is_redacted() {
        let token = ControllerToken::generate();
        let debug = format!("{token:?}");
        assert!(!debug.contains(token.reveal()));
        assert_eq!(debug, "ControllerToken(redacted)");
    }

    #[test]
    fn mismatched_lengths_compare_unequal() {
        let a = ControllerToken::from("abc");
        let b = ControllerToken::from("abcd");
        assert!(!a.ct_eq(&b));
    }
}
