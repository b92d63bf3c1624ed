//! The agent's X25519 key-exchange keypair
//!
//! The public half doubles as the agent identity that a capability grant's
//! `subject` field is checked against. The private half exists only inside
//! this process and the owner-only keystore record.

use custos_core::Effects;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroize;

/// Algorithm name written into the persisted keypair record
pub const KEY_ALGORITHM: &str = "x25519";

/// An agent's X25519 keypair.
#[derive(Clone)]
pub struct AgentKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl AgentKeyPair {
    /// Generate a new keypair from injected randomness.
    ///
    /// Production effects draw from the OS CSPRNG; the secret is clamped
    /// per the X25519 specification by the underlying type.
    pub fn generate(effects: &Effects) -> Self {
        let mut secret_bytes: [u8; 32] = effects.random_bytes();
        let keypair = Self::from_secret_bytes(secret_bytes);
        secret_bytes.zeroize();
        keypair
    }

    /// Restore a keypair from raw secret key bytes.
    pub fn from_secret_bytes(secret_bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret_bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// X25519 public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Raw secret key bytes (clamped). Only the keystore serializes these.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// The X25519 secret for key agreement.
    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Diffie-Hellman key agreement with a peer public key.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> SharedSecret {
        self.secret.diffie_hellman(their_public)
    }
}

impl std::fmt::Debug for AgentKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentKeyPair")
            .field("public", &hex::encode(self.public.to_bytes()))
            .field("secret", &"<redacted>")
            .finish()
    }
}
