//! Audit entries and their canonical digest
//!
//! Wire contract (camelCase): `{id, timestamp, action, details, hashes,
//! duration?, prevHash, hash}`. The digest of an entry is SHA-256 over the
//! canonical serialization of every field except `hash`, produced from a
//! dedicated digest-subset struct so the excluded field cannot leak in.

use crate::error::AuditError;
use custos_core::hash::canonical_digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical audit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A grant arrived and parsed successfully
    TokenReceived,
    /// A grant passed validation
    TokenValidated,
    /// A grant was rejected by validation or the data-access boundary
    TokenRejected,
    /// The grant's DEK was unwrapped
    DekUnwrapped,
    /// Ciphertext was fetched from the object store
    DataFetched,
    /// A payload was decrypted under the DEK
    DataDecrypted,
    /// The host started inference over the decrypted data
    InferenceStarted,
    /// The host completed inference
    InferenceCompleted,
    /// An output payload was encrypted under the DEK
    OutputEncrypted,
    /// An encrypted output was written back to the object store
    OutputStored,
    /// An operation failed
    Error,
}

/// String-keyed entry details.
///
/// A `BTreeMap` so canonical serialization is independent of insertion
/// order. Values are restricted by convention to hashes, counts, and
/// categorical strings: never raw user data.
pub type Details = BTreeMap<String, serde_json::Value>;

/// Optional payload digests attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHashes {
    /// SHA-256 of the operation's plaintext input, lowercase hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// SHA-256 of the operation's plaintext output, lowercase hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl EntryHashes {
    /// Hashes with only an input digest.
    pub fn input(digest: impl Into<String>) -> Self {
        EntryHashes {
            input: Some(digest.into()),
            output: None,
        }
    }

    /// Hashes with only an output digest.
    pub fn output(digest: impl Into<String>) -> Self {
        EntryHashes {
            input: None,
            output: Some(digest.into()),
        }
    }
}

/// One immutable entry of an audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Entry identifier
    pub id: uuid::Uuid,
    /// Unix seconds at append time
    pub timestamp: u64,
    /// What happened
    pub action: AuditAction,
    /// Categorical metadata (sorted keys)
    pub details: Details,
    /// Optional payload digests
    pub hashes: EntryHashes,
    /// Optional operation duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Digest of the previous entry (genesis: 64 zero hex digits)
    pub prev_hash: String,
    /// Digest of this entry's canonical serialization, `hash` excluded
    pub hash: String,
}

impl AuditEntry {
    /// Recompute this entry's digest from its own fields.
    ///
    /// Matches the stored `hash` exactly when the entry is untampered.
    pub fn compute_hash(&self) -> Result<String, AuditError> {
        let digest = EntryDigest {
            id: &self.id,
            timestamp: self.timestamp,
            action: self.action,
            details: &self.details,
            hashes: &self.hashes,
            duration: self.duration,
            prev_hash: &self.prev_hash,
        };
        Ok(canonical_digest(&digest)?)
    }
}

/// The digest subset of an entry: every field except `hash`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryDigest<'a> {
    id: &'a uuid::Uuid,
    timestamp: u64,
    action: AuditAction,
    details: &'a Details,
    hashes: &'a EntryHashes,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u64>,
    prev_hash: &'a str,
}
