//! # Custos Crypto - Layer 2: Key Custody and Sealing
//!
//! Cryptographic operations for the Custos capability-token security core.
//!
//! ## Purpose
//!
//! Layer 2 crate providing:
//! - The agent's X25519 key-exchange keypair and its file-backed store
//! - DEK unwrapping: X25519 Diffie-Hellman + HKDF-SHA256 + ChaCha20-Poly1305
//! - Authenticated payload encryption with AES-256-GCM
//! - Ed25519 helpers used for grant signature verification
//!
//! ## Security
//!
//! - The private key never leaves process memory except as the persisted
//!   keypair record written with owner-only permissions
//! - Unwrapped DEKs live only inside [`DataKey`], which zeroizes on drop
//! - Derived wrap keys and intermediate buffers are zeroized before return
//! - No function in this crate logs key material

pub mod cipher;
pub mod error;
pub mod keypair;
pub mod keystore;
pub mod signature;
pub mod unwrap;

pub use cipher::{decrypt_payload, encrypt_payload, NONCE_LEN, TAG_LEN};
pub use error::{CipherError, KeyStoreError, SignatureError, UnwrapError};
pub use keypair::{AgentKeyPair, KEY_ALGORITHM};
pub use keystore::KeyPairStore;
pub use signature::{
    ed25519_sign, ed25519_verify, ed25519_verifying_key, ed25519_verifying_key_from_bytes,
    generate_ed25519_key, Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey,
};
pub use unwrap::{unwrap_dek, wrap_dek, DataKey, WrappedKey, DEK_LEN};
