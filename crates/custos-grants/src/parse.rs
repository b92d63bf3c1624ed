//! Strict grant parsing
//!
//! Parsing only produces a typed value or fails; trust decisions live in
//! [`crate::validate`]. Missing fields, wrong types, unknown fields, bad
//! base64, and wrong-width binary fields all fail here, so a malformed
//! grant can never reach the validator holding partially-filled fields.

use crate::error::GrantError;
use crate::grant::CapabilityGrant;

/// Parse wire bytes into a capability grant.
pub fn parse_grant(wire_bytes: &[u8]) -> Result<CapabilityGrant, GrantError> {
    serde_json::from_slice(wire_bytes)
        .map_err(|e| GrantError::malformed(format!("Grant decode failed: {e}")))
}
