//! File-backed persistence for the agent keypair
//!
//! The keypair is created lazily on first use and persists across restarts.
//! A record that exists but cannot be decoded is a fatal, operator-visible
//! condition: regenerating would orphan every grant issued to the old
//! public key, so the store never regenerates silently.

use crate::error::KeyStoreError;
use crate::keypair::{AgentKeyPair, KEY_ALGORITHM};
use base64::Engine;
use custos_core::Effects;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// Persisted keypair record.
///
/// Wire contract: `{"publicKey": base64, "privateKey": base64,
/// "createdAt": unix seconds, "algorithm": "x25519"}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedKeyPair {
    public_key: String,
    private_key: String,
    created_at: u64,
    algorithm: String,
}

impl Drop for PersistedKeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// File-backed store for the agent's keypair.
pub struct KeyPairStore {
    path: PathBuf,
    effects: Effects,
}

impl KeyPairStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>, effects: Effects) -> Self {
        Self {
            path: path.into(),
            effects,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted keypair, generating and persisting a fresh one on
    /// first run.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Corrupt`] when a record exists but cannot be
    /// decoded. Callers must treat this as fatal and must not proceed with a
    /// degraded identity.
    pub fn get_or_create(&self) -> Result<AgentKeyPair, KeyStoreError> {
        if self.path.exists() {
            return self.load();
        }

        let keypair = AgentKeyPair::generate(&self.effects);
        self.save(&keypair)?;
        tracing::info!(
            public_key = %base64_engine().encode(keypair.public_key_bytes()),
            "Generated new agent keypair"
        );
        Ok(keypair)
    }

    /// Persist a keypair with owner-only permissions.
    pub fn save(&self, keypair: &AgentKeyPair) -> Result<(), KeyStoreError> {
        let engine = base64_engine();
        let record = PersistedKeyPair {
            public_key: engine.encode(keypair.public_key_bytes()),
            private_key: engine.encode(keypair.secret_bytes()),
            created_at: self
                .effects
                .now()
                .map_err(|e| KeyStoreError::Io(std::io::Error::other(e.to_string())))?,
            algorithm: KEY_ALGORITHM.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut json = serde_json::to_vec_pretty(&record)
            .map_err(|e| KeyStoreError::corrupt(format!("Failed to encode keypair: {e}")))?;
        std::fs::write(&self.path, &json)?;
        json.zeroize();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Remove the persisted keypair. Returns whether a record existed.
    pub fn delete(&self) -> Result<bool, KeyStoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        tracing::warn!("Agent keypair deleted by operator action");
        Ok(true)
    }

    fn load(&self) -> Result<AgentKeyPair, KeyStoreError> {
        let bytes = std::fs::read(&self.path)?;
        let record: PersistedKeyPair = serde_json::from_slice(&bytes)
            .map_err(|e| KeyStoreError::corrupt(format!("Failed to decode record: {e}")))?;

        if record.algorithm != KEY_ALGORITHM {
            return Err(KeyStoreError::corrupt(format!(
                "Unsupported key algorithm: {}",
                record.algorithm
            )));
        }

        let engine = base64_engine();
        let mut secret_bytes: [u8; 32] = engine
            .decode(&record.private_key)
            .map_err(|_| KeyStoreError::corrupt("Private key is not valid base64"))?
            .try_into()
            .map_err(|_| KeyStoreError::corrupt("Private key has wrong length"))?;

        let keypair = AgentKeyPair::from_secret_bytes(secret_bytes);
        secret_bytes.zeroize();

        // The stored public half must match the secret, otherwise the record
        // was tampered with or truncated.
        let expected_public = engine
            .decode(&record.public_key)
            .map_err(|_| KeyStoreError::corrupt("Public key is not valid base64"))?;
        if expected_public != keypair.public_key_bytes() {
            return Err(KeyStoreError::corrupt(
                "Public key does not match private key",
            ));
        }

        Ok(keypair)
    }
}

fn base64_engine() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
