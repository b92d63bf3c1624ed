//! The audit export document
//!
//! Wire contract (camelCase): `{sessionId, startedAt, completedAt,
//! entries, dataHash?, resultHash?}`. A downstream verifier consumes this
//! document bit-exactly; [`verify_export`] re-checks the chain with no
//! access to agent state, so a user can store the export in their own
//! vault and have the issuer re-verify it out of band.

use crate::chain::{verify_entries, VerificationResult};
use crate::entry::AuditEntry;
use custos_core::SessionId;
use serde::{Deserialize, Serialize};

/// Self-contained, shareable audit document for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditExport {
    /// The session that produced the chain
    pub session_id: SessionId,
    /// Session start, Unix seconds
    pub started_at: u64,
    /// Session end, Unix seconds
    pub completed_at: u64,
    /// The full chain, in append order
    pub entries: Vec<AuditEntry>,
    /// SHA-256 of the decrypted input payload, when one was decrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// SHA-256 of the plaintext output, when one was encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_hash: Option<String>,
}

/// Independently re-verify an exported chain.
pub fn verify_export(export: &AuditExport) -> VerificationResult {
    verify_entries(&export.entries)
}
