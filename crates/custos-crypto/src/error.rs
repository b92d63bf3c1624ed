//! Error types for cryptographic operations
//!
//! One enum per concern, mirroring the failure taxonomy of the security
//! core: keystore corruption is fatal, unwrap and decrypt failures are
//! security events with a single indistinguishable cause each.

/// Errors from the persisted keypair store.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// The persisted record exists but cannot be decoded.
    ///
    /// This is fatal: silently regenerating the keypair would invalidate
    /// every outstanding grant issued to the old public key.
    #[error("Persisted keypair is corrupt: {message}")]
    Corrupt {
        /// Description of the decode failure (never includes file contents)
        message: String,
    },

    /// Reading or writing the keypair file failed
    #[error("Keypair store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyStoreError {
    /// Create a corruption error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Errors from DEK unwrapping.
///
/// Wrong key, corrupted ciphertext, and tampering are deliberately
/// indistinguishable: the authenticated decryption either yields the DEK or
/// it does not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnwrapError {
    /// The authenticated decryption of the wrapped key was rejected
    #[error("DEK unwrap failed: authentication failed")]
    AuthenticationFailed,
}

/// Errors from payload encryption/decryption.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// Authentication tag verification failed.
    ///
    /// Treated identically to access denied; no partial plaintext exists.
    #[error("Payload decryption failed: authentication tag mismatch")]
    TagMismatch,

    /// The AEAD encryption call itself failed
    #[error("Payload encryption failed: {message}")]
    Encryption {
        /// Description of the encryption failure
        message: String,
    },
}

/// Errors from Ed25519 signature helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The public key bytes do not form a valid Ed25519 point
    #[error("Invalid Ed25519 public key")]
    InvalidKey,

    /// The signature does not verify over the given message
    #[error("Signature verification failed")]
    VerificationFailed,
}
