//! Issuer directory collaborator interface
//!
//! The Signer/Verifier authority that mints grants is external; the agent
//! only needs its Ed25519 verifying key, resolved by issuer identity.

use custos_crypto::Ed25519VerifyingKey;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Lookup of issuer verifying keys by identity.
pub trait IssuerDirectory: Send + Sync {
    /// Resolve the verifying key for an issuer identity, if known.
    fn verifying_key(&self, issuer: &str) -> Option<Ed25519VerifyingKey>;
}

/// In-memory issuer directory.
///
/// Production deployments back this with the operator's trust store; the
/// directory only ever holds public keys.
#[derive(Default)]
pub struct MemoryIssuerDirectory {
    keys: RwLock<HashMap<String, Ed25519VerifyingKey>>,
}

impl MemoryIssuerDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an issuer's verifying key.
    pub fn register(&self, issuer: impl Into<String>, key: Ed25519VerifyingKey) {
        self.keys.write().insert(issuer.into(), key);
    }

    /// Register and return the directory, for chaining.
    pub fn with_issuer(self, issuer: impl Into<String>, key: Ed25519VerifyingKey) -> Self {
        self.register(issuer, key);
        self
    }
}

impl IssuerDirectory for MemoryIssuerDirectory {
    fn verifying_key(&self, issuer: &str) -> Option<Ed25519VerifyingKey> {
        self.keys.read().get(issuer).copied()
    }
}
