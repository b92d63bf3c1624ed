//! Authenticated payload encryption
//!
//! User payloads are sealed with AES-256-GCM under the unwrapped DEK. The
//! random 96-bit nonce is prepended to the ciphertext and the 128-bit
//! authentication tag is appended by the AEAD, so a payload blob is
//! `nonce || ciphertext || tag` and decryption needs no side channel.

use crate::error::CipherError;
use crate::unwrap::DataKey;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key,
};
use custos_core::Effects;

/// AES-GCM nonce width in bytes
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag width in bytes
pub const TAG_LEN: usize = 16;

/// Encrypt a payload under the DEK.
///
/// Returns `nonce || ciphertext || tag`.
pub fn encrypt_payload(
    plaintext: &[u8],
    key: &DataKey,
    effects: &Effects,
) -> Result<Vec<u8>, CipherError> {
    let nonce: [u8; NONCE_LEN] = effects.random_bytes();
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let ciphertext = cipher
        .encrypt(&nonce.into(), plaintext)
        .map_err(|e| CipherError::Encryption {
            message: format!("AES-GCM encryption failed: {e}"),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a payload blob under the DEK.
///
/// # Errors
///
/// [`CipherError::TagMismatch`] on any authentication failure, including a
/// blob too short to hold a nonce and tag. Callers treat this identically
/// to access denied; no partial plaintext is ever produced.
pub fn decrypt_payload(blob: &[u8], key: &DataKey) -> Result<Vec<u8>, CipherError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CipherError::TagMismatch);
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(nonce.into(), ciphertext)
        .map_err(|_| CipherError::TagMismatch)
}
