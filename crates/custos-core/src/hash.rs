//! Canonical SHA-256 hashing utilities
//!
//! The audit chain and the grant signature check both hash a canonical
//! JSON serialization of a value. Canonical here means: struct fields in
//! declaration order, map keys sorted (callers use `BTreeMap`), optional
//! fields omitted when absent. Digests are lowercase hex.

use crate::error::{CoreError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 32-byte digest value
pub type Hash32 = [u8; 32];

/// SHA-256 of raw bytes, lowercase hex encoded
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON serialization of a value, lowercase hex
pub fn canonical_digest<T: Serialize>(value: &T) -> Result<String> {
    let bytes = canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Canonical JSON serialization of a value
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| CoreError::serialization(format!("Canonical serialization failed: {e}")))
}
