//! Canonical state hashing.
//!
//! Tests compare fingerprints instead of whole structures when asserting
//! "nothing changed" or "this sequence is a no-op".

use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of the value's canonical JSON encoding.
///
/// Deterministic as long as the type serializes deterministically (structs
/// and sequences do; unordered maps would not).
pub fn json_fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(sha256_hex(&bytes))
}
