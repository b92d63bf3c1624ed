//! # Custos Audit - Layer 3: Tamper-Evident Audit Chain
//!
//! Append-only, hash-linked audit log for the Custos security core.
//!
//! ## Purpose
//!
//! Layer 3 crate providing:
//! - [`AuditChain`]: one per session, append-only, hash-linked
//! - [`AuditChain::verify`]: full re-verification of every linkage
//! - [`AuditExport`]: the self-contained document a grant issuer can
//!   re-verify with [`verify_export`] and no access to agent state
//!
//! ## Invariants
//!
//! - Entries are appended, never edited or removed
//! - `entry[i].prev_hash == hash(entry[i-1])` for all i > 0; the genesis
//!   previous hash is 64 zero hex digits
//! - `hash(entry)` is the SHA-256 digest of the entry's canonical JSON
//!   serialization excluding the `hash` field itself
//! - No entry ever embeds raw user data: only hashes, counts, and
//!   categorical metadata (enforced by convention at every call site)

pub mod chain;
pub mod entry;
pub mod error;
pub mod export;

pub use chain::{verify_entries, AuditChain, VerificationResult, GENESIS_HASH};
pub use entry::{AuditAction, AuditEntry, Details, EntryHashes};
pub use error::AuditError;
pub use export::{verify_export, AuditExport};
