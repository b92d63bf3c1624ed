//! Aggregated error type for the session runtime
//!
//! Component failures keep their own types; the session surfaces them
//! unchanged after emitting the corresponding audit entry. Nothing here
//! carries key material or plaintext.

use custos_audit::AuditError;
use custos_crypto::{CipherError, KeyStoreError, UnwrapError};
use custos_grants::{GrantError, RejectionReason};

use crate::store::StoreError;

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The grant wire bytes did not parse
    #[error(transparent)]
    Grant(#[from] GrantError),

    /// The grant was rejected by validation or the data-access boundary
    #[error("Grant rejected: {0}")]
    Rejected(#[from] RejectionReason),

    /// DEK unwrapping failed (security event)
    #[error(transparent)]
    Unwrap(#[from] UnwrapError),

    /// Payload encryption or decryption failed (security event)
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The keypair store failed
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    /// The audit chain could not record an operation
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The object store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
