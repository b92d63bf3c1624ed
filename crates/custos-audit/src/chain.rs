//! The append-only audit chain
//!
//! One chain per session, exclusively owned by that session's execution
//! context. Appending computes the previous-entry linkage and the entry
//! digest; altering any historical entry changes its digest and breaks
//! every subsequent linkage.

use crate::entry::{AuditAction, AuditEntry, Details, EntryHashes};
use crate::error::AuditError;
use crate::export::AuditExport;
use custos_core::{Effects, SessionId};

/// Previous-hash value of the first entry: 64 zero hex digits.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Outcome of verifying a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether every linkage and digest checked out
    pub valid: bool,
    /// Index of the first entry that failed, when invalid
    pub broken_at: Option<usize>,
}

impl VerificationResult {
    /// A fully valid result.
    pub fn valid() -> Self {
        VerificationResult {
            valid: true,
            broken_at: None,
        }
    }

    /// A result broken at the given index.
    pub fn broken_at(index: usize) -> Self {
        VerificationResult {
            valid: false,
            broken_at: Some(index),
        }
    }
}

/// Append-only, hash-linked audit log owned by one session.
pub struct AuditChain {
    session_id: SessionId,
    started_at: u64,
    entries: Vec<AuditEntry>,
    effects: Effects,
}

impl AuditChain {
    /// Start a fresh chain for a session.
    pub fn new(session_id: SessionId, effects: Effects) -> Result<Self, AuditError> {
        let started_at = effects.now().map_err(AuditError::from)?;
        Ok(AuditChain {
            session_id,
            started_at,
            entries: Vec::new(),
            effects,
        })
    }

    /// The owning session's identifier.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// When this chain was started, Unix seconds.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// The entries appended so far.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry with details only.
    pub fn append(
        &mut self,
        action: AuditAction,
        details: Details,
    ) -> Result<&AuditEntry, AuditError> {
        self.append_with(action, details, EntryHashes::default(), None)
    }

    /// Append an entry carrying payload digests and/or a duration.
    pub fn append_with(
        &mut self,
        action: AuditAction,
        details: Details,
        hashes: EntryHashes,
        duration: Option<u64>,
    ) -> Result<&AuditEntry, AuditError> {
        let prev_hash = self
            .entries
            .last()
            .map_or_else(|| GENESIS_HASH.to_string(), |tail| tail.hash.clone());

        let mut entry = AuditEntry {
            id: self.effects.gen_uuid(),
            timestamp: self.effects.now().map_err(AuditError::from)?,
            action,
            details,
            hashes,
            duration,
            prev_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash()?;

        tracing::debug!(action = ?action, index = self.entries.len(), "Audit entry appended");
        self.entries.push(entry);
        // Just pushed, the tail exists
        #[allow(clippy::expect_used)]
        Ok(self.entries.last().expect("entry just appended"))
    }

    /// Re-verify every linkage and digest from index 0.
    pub fn verify(&self) -> VerificationResult {
        verify_entries(&self.entries)
    }

    /// Wrap the chain into a self-contained export document.
    pub fn export(
        &self,
        completed_at: u64,
        data_hash: Option<String>,
        result_hash: Option<String>,
    ) -> AuditExport {
        AuditExport {
            session_id: self.session_id,
            started_at: self.started_at,
            completed_at,
            entries: self.entries.clone(),
            data_hash,
            result_hash,
        }
    }
}

/// Verify a sequence of entries with no access to chain state.
///
/// Reports the first index at which either the previous-hash linkage or
/// the recomputed digest fails.
pub fn verify_entries(entries: &[AuditEntry]) -> VerificationResult {
    let mut expected_prev = GENESIS_HASH;
    for (index, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev {
            return VerificationResult::broken_at(index);
        }
        match entry.compute_hash() {
            Ok(digest) if digest == entry.hash => {}
            _ => return VerificationResult::broken_at(index),
        }
        expected_prev = &entry.hash;
    }
    VerificationResult::valid()
}
