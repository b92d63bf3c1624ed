//! DEK wrapping and unwrapping
//!
//! A grant carries its data-encryption key wrapped for the subject agent:
//! the issuer performs X25519 Diffie-Hellman between a one-time ephemeral
//! secret and the agent's public key, derives a wrap key with HKDF-SHA256,
//! and seals the DEK with ChaCha20-Poly1305. Only the agent's private key
//! can recover it.
//!
//! # Security
//!
//! - Wrong key, corrupted ciphertext, and tampering all surface as the
//!   single [`UnwrapError::AuthenticationFailed`]; there is no partial
//!   success
//! - The shared secret, derived wrap key, and intermediate plaintext are
//!   zeroized before the call returns
//! - The recovered DEK is handed out only as [`DataKey`], which zeroizes
//!   on drop

use crate::error::UnwrapError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use custos_core::Effects;
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Width of a data-encryption key in bytes
pub const DEK_LEN: usize = 32;

/// HKDF domain separation for the DEK wrap key
const WRAP_INFO: &[u8] = b"custos-dek-wrap-v1";

/// A 256-bit data-encryption key.
///
/// Zeroized on drop; never serialized, never logged.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; DEK_LEN]);

impl DataKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; DEK_LEN]) -> Self {
        DataKey(bytes)
    }

    /// Generate a fresh DEK from injected randomness.
    pub fn generate(effects: &Effects) -> Self {
        DataKey(effects.random_bytes())
    }

    /// Raw key bytes, for use by the payload cipher only.
    pub fn as_bytes(&self) -> &[u8; DEK_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey(<redacted>)")
    }
}

/// A DEK wrapped for a specific recipient.
///
/// The decoded form of the grant's `wrappedKey` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    /// ChaCha20-Poly1305 ciphertext of the DEK (tag appended)
    pub ciphertext: Vec<u8>,
    /// Sender's one-time X25519 public key
    pub ephemeral_public_key: [u8; 32],
    /// AEAD nonce
    pub nonce: [u8; 12],
}

/// Recover the DEK from a wrapped key using the agent's private key.
///
/// # Errors
///
/// [`UnwrapError::AuthenticationFailed`] whenever the authenticated
/// decryption rejects the ciphertext or the recovered plaintext is not a
/// 256-bit key. The caller must log this as a security event and must not
/// retry with the same material.
pub fn unwrap_dek(wrapped: &WrappedKey, private_key: &StaticSecret) -> Result<DataKey, UnwrapError> {
    let ephemeral = PublicKey::from(wrapped.ephemeral_public_key);
    let shared = private_key.diffie_hellman(&ephemeral);

    let mut wrap_key = derive_wrap_key(shared.as_bytes());
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&wrap_key));
    let result = cipher.decrypt(Nonce::from_slice(&wrapped.nonce), wrapped.ciphertext.as_slice());
    wrap_key.zeroize();

    let plaintext = Zeroizing::new(result.map_err(|_| UnwrapError::AuthenticationFailed)?);
    let dek: [u8; DEK_LEN] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| UnwrapError::AuthenticationFailed)?;

    Ok(DataKey::from_bytes(dek))
}

/// Wrap a DEK for a recipient public key.
///
/// Issuer-side counterpart of [`unwrap_dek`]; the ephemeral secret is
/// drawn from effects randomness and dropped immediately after the key
/// agreement.
pub fn wrap_dek(
    dek: &DataKey,
    recipient_public_key: &[u8; 32],
    effects: &Effects,
) -> Result<WrappedKey, UnwrapError> {
    let mut ephemeral_bytes: [u8; 32] = effects.random_bytes();
    let ephemeral_secret = StaticSecret::from(ephemeral_bytes);
    ephemeral_bytes.zeroize();

    let ephemeral_public = PublicKey::from(&ephemeral_secret);
    let shared = ephemeral_secret.diffie_hellman(&PublicKey::from(*recipient_public_key));

    let mut wrap_key = derive_wrap_key(shared.as_bytes());
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&wrap_key));
    let nonce: [u8; 12] = effects.random_bytes();
    let result = cipher.encrypt(Nonce::from_slice(&nonce), dek.as_bytes().as_slice());
    wrap_key.zeroize();

    let ciphertext = result.map_err(|_| UnwrapError::AuthenticationFailed)?;

    Ok(WrappedKey {
        ciphertext,
        ephemeral_public_key: ephemeral_public.to_bytes(),
        nonce,
    })
}

/// HKDF-SHA256 expansion of the DH shared secret into the wrap key.
fn derive_wrap_key(shared_secret: &[u8; 32]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut wrap_key = [0u8; 32];
    // Expanding 32 bytes out of SHA-256 output cannot fail
    #[allow(clippy::expect_used)]
    hk.expand(WRAP_INFO, &mut wrap_key)
        .expect("HKDF expand of one block");
    wrap_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::AgentKeyPair;
    use assert_matches::assert_matches;

    #[test]
    fn wrap_unwrap_roundtrip() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let dek = DataKey::generate(&effects);

        let wrapped = wrap_dek(&dek, &agent.public_key_bytes(), &effects).unwrap();
        let recovered = unwrap_dek(&wrapped, agent.secret()).unwrap();
        assert_eq!(recovered, dek);
    }

    #[test]
    fn wrong_private_key_fails_authentication() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let other = AgentKeyPair::generate(&effects);
        let dek = DataKey::generate(&effects);

        let wrapped = wrap_dek(&dek, &agent.public_key_bytes(), &effects).unwrap();
        assert_matches!(
            unwrap_dek(&wrapped, other.secret()),
            Err(UnwrapError::AuthenticationFailed)
        );
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let dek = DataKey::generate(&effects);

        let mut wrapped = wrap_dek(&dek, &agent.public_key_bytes(), &effects).unwrap();
        wrapped.ciphertext[0] ^= 0xff;
        assert_matches!(
            unwrap_dek(&wrapped, agent.secret()),
            Err(UnwrapError::AuthenticationFailed)
        );
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let dek = DataKey::generate(&effects);

        let mut wrapped = wrap_dek(&dek, &agent.public_key_bytes(), &effects).unwrap();
        wrapped.nonce[0] ^= 0x01;
        assert_matches!(
            unwrap_dek(&wrapped, agent.secret()),
            Err(UnwrapError::AuthenticationFailed)
        );
    }

    #[test]
    fn wrapped_ciphertext_carries_auth_tag() {
        let effects = Effects::test();
        let agent = AgentKeyPair::generate(&effects);
        let dek = DataKey::generate(&effects);

        let wrapped = wrap_dek(&dek, &agent.public_key_bytes(), &effects).unwrap();
        assert_eq!(wrapped.ciphertext.len(), DEK_LEN + 16);
    }
}
