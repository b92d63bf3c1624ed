//! The capability grant wire model
//!
//! Grants arrive as camelCase JSON. Deserialization goes through a wire
//! struct so that base64 fields are decoded to fixed-width byte types
//! during parse: a grant that reaches the validator is fully typed, never
//! partially filled.
//!
//! Wire contract:
//!
//! ```json
//! {
//!   "id": "grant-9f2c",
//!   "issuer": "did:web:vault.example",
//!   "subject": "<base64 X25519 public key>",
//!   "issuedAt": 1735689600,
//!   "expiresAt": 1735693200,
//!   "scopes": [{"path": "health/metrics", "permissions": ["read"]}],
//!   "resourceLocator": "vault://objects/sha256-abc",
//!   "wrappedKey": {
//!     "ciphertext": "<base64>",
//!     "ephemeralPublicKey": "<base64 32 bytes>",
//!     "nonce": "<base64 12 bytes>"
//!   },
//!   "signature": "<base64 64 bytes, optional>",
//!   "signatureAlgorithm": "ed25519"
//! }
//! ```

use crate::error::GrantError;
use crate::scope::Scope;
use base64::Engine;
use custos_core::hash::canonical_bytes;
use custos_crypto::WrappedKey;
use serde::{Deserialize, Serialize};

/// Signature algorithm accepted for grant verification
pub const SIGNATURE_ALGORITHM_ED25519: &str = "ed25519";

/// An immutable, fully decoded capability grant.
///
/// Validation produces a separate verdict ([`crate::ValidGrant`]); this
/// value is never edited after parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireGrant", into = "WireGrant")]
pub struct CapabilityGrant {
    /// Opaque unique grant identifier
    pub id: String,
    /// Issuer identity (a decentralized identifier)
    pub issuer: String,
    /// The subject agent's X25519 public key
    pub subject: [u8; 32],
    /// Issue time, Unix seconds
    pub issued_at: u64,
    /// Expiry time, Unix seconds
    pub expires_at: u64,
    /// Ordered scope entries
    pub scopes: Vec<Scope>,
    /// Pointer to the ciphertext in the object store
    pub resource_locator: String,
    /// The DEK, wrapped for the subject
    pub wrapped_key: WrappedKey,
    /// Issuer signature over the signable subset
    pub signature: Option<[u8; 64]>,
    /// Signature algorithm name, present iff `signature` is
    pub signature_algorithm: Option<String>,
}

impl CapabilityGrant {
    /// Canonical bytes the issuer signs: the grant serialized without its
    /// signature fields.
    ///
    /// The signable subset is a dedicated struct, so the signature fields
    /// cannot leak into the signed payload and no delete-then-restore step
    /// exists.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, GrantError> {
        let view = GrantSigningView {
            id: &self.id,
            issuer: &self.issuer,
            subject: b64(&self.subject),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            scopes: &self.scopes,
            resource_locator: &self.resource_locator,
            wrapped_key: WireWrappedKey::from(&self.wrapped_key),
        };
        canonical_bytes(&view).map_err(|e| GrantError::malformed(e.to_string()))
    }
}

/// The signable subset of a grant. Signature fields do not exist here.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GrantSigningView<'a> {
    id: &'a str,
    issuer: &'a str,
    subject: String,
    issued_at: u64,
    expires_at: u64,
    scopes: &'a [Scope],
    resource_locator: &'a str,
    wrapped_key: WireWrappedKey,
}

// ========== Wire representation ==========

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireGrant {
    id: String,
    issuer: String,
    subject: String,
    issued_at: u64,
    expires_at: u64,
    scopes: Vec<Scope>,
    resource_locator: String,
    wrapped_key: WireWrappedKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature_algorithm: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireWrappedKey {
    ciphertext: String,
    ephemeral_public_key: String,
    nonce: String,
}

impl From<&WrappedKey> for WireWrappedKey {
    fn from(key: &WrappedKey) -> Self {
        WireWrappedKey {
            ciphertext: b64(&key.ciphertext),
            ephemeral_public_key: b64(&key.ephemeral_public_key),
            nonce: b64(&key.nonce),
        }
    }
}

impl TryFrom<WireGrant> for CapabilityGrant {
    type Error = GrantError;

    fn try_from(wire: WireGrant) -> Result<Self, Self::Error> {
        let subject = decode_fixed::<32>("subject", &wire.subject)?;
        let wrapped_key = WrappedKey {
            ciphertext: decode_b64("wrappedKey.ciphertext", &wire.wrapped_key.ciphertext)?,
            ephemeral_public_key: decode_fixed::<32>(
                "wrappedKey.ephemeralPublicKey",
                &wire.wrapped_key.ephemeral_public_key,
            )?,
            nonce: decode_fixed::<12>("wrappedKey.nonce", &wire.wrapped_key.nonce)?,
        };
        let signature = wire
            .signature
            .as_deref()
            .map(|s| decode_fixed::<64>("signature", s))
            .transpose()?;

        Ok(CapabilityGrant {
            id: wire.id,
            issuer: wire.issuer,
            subject,
            issued_at: wire.issued_at,
            expires_at: wire.expires_at,
            scopes: wire.scopes,
            resource_locator: wire.resource_locator,
            wrapped_key,
            signature,
            signature_algorithm: wire.signature_algorithm,
        })
    }
}

impl From<CapabilityGrant> for WireGrant {
    fn from(grant: CapabilityGrant) -> Self {
        WireGrant {
            id: grant.id,
            issuer: grant.issuer,
            subject: b64(&grant.subject),
            issued_at: grant.issued_at,
            expires_at: grant.expires_at,
            scopes: grant.scopes,
            resource_locator: grant.resource_locator,
            wrapped_key: WireWrappedKey::from(&grant.wrapped_key),
            signature: grant.signature.as_ref().map(|s| b64(s.as_slice())),
            signature_algorithm: grant.signature_algorithm,
        }
    }
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, GrantError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|_| GrantError::malformed(format!("Field {field} is not valid base64")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N], GrantError> {
    decode_b64(field, value)?.try_into().map_err(|_| {
        GrantError::malformed(format!("Field {field} must decode to {N} bytes"))
    })
}
