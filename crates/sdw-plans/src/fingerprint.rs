//! Configuration fingerprints
//!
//! Provides [`Fingerprint`], a Blake3 digest of a configuration's canonical
//! JSON. Used to prove that augmentation leaves existing entries untouched.

use std::fmt::{self, Display, Formatter};

use serde_json::Value as JsonValue;

/// A 32-byte Blake3 digest of canonical JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create a fingerprint from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint a JSON value
    ///
    /// Key order does not matter: objects are hashed with sorted keys.
    #[inline]
    #[must_use]
    pub fn of(value: &JsonValue) -> Self {
        let canonical = canonical_json(value);
        Self::new(*blake3::hash(canonical.as_bytes()).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Generate canonical JSON (sorted keys, no whitespace)
pub(crate) fn canonical_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();

            let parts: Vec<_> = keys
                .into_iter()
                .filter_map(|key| {
                    map.get(key).map(|val| {
                        format!("{}:{}", JsonValue::String(key.clone()), canonical_json(val))
                    })
                })
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        JsonValue::Array(arr) => {
            let parts: Vec<_> = arr.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        // Scalars already have a single JSON spelling
        other => other.to_string(),
    }
}
