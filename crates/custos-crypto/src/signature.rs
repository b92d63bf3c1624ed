//! Ed25519 helpers for grant signature verification
//!
//! The grant issuer signs the canonical signable subset of a capability
//! grant with Ed25519; the agent verifies against the issuer public key
//! resolved through the issuer directory.

use crate::error::SignatureError;
use custos_core::Effects;
use ed25519_dalek::{Signer, Verifier};

pub use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};

/// Generate an Ed25519 signing key from injected randomness.
pub fn generate_ed25519_key(effects: &Effects) -> Ed25519SigningKey {
    let seed: [u8; 32] = effects.random_bytes();
    Ed25519SigningKey::from_bytes(&seed)
}

/// Get the verifying key from a signing key.
pub fn ed25519_verifying_key(signing_key: &Ed25519SigningKey) -> Ed25519VerifyingKey {
    signing_key.verifying_key()
}

/// Create an Ed25519 verifying key from raw bytes.
pub fn ed25519_verifying_key_from_bytes(
    bytes: &[u8; 32],
) -> Result<Ed25519VerifyingKey, SignatureError> {
    Ed25519VerifyingKey::from_bytes(bytes).map_err(|_| SignatureError::InvalidKey)
}

/// Sign data with Ed25519.
pub fn ed25519_sign(signing_key: &Ed25519SigningKey, data: &[u8]) -> Ed25519Signature {
    signing_key.sign(data)
}

/// Verify an Ed25519 signature.
pub fn ed25519_verify(
    verifying_key: &Ed25519VerifyingKey,
    data: &[u8],
    signature: &Ed25519Signature,
) -> Result<(), SignatureError> {
    verifying_key
        .verify(data, signature)
        .map_err(|_| SignatureError::VerificationFailed)
}
