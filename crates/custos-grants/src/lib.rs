//! # Custos Grants - Layer 3: Capability Grants
//!
//! Capability grant handling for the Custos security core.
//!
//! ## Purpose
//!
//! Layer 3 crate providing:
//! - The typed [`CapabilityGrant`] wire model with a strict parse step
//! - Pure validation (subject binding, expiry, issuer signature, scope
//!   well-formedness) producing a [`ValidGrant`] verdict
//! - `/`-bounded wildcard scope matching for the data-access boundary
//!
//! ## Architecture Constraints
//!
//! - Parsing performs no trust decisions; it only produces a typed value
//!   or fails with [`GrantError::Malformed`]
//! - Validation is a pure function of grant + current time + agent
//!   identity + policy; audit emission belongs to the session layer
//! - Grants are immutable after parse; validation returns a separate
//!   verdict, never an edited grant

pub mod error;
pub mod grant;
pub mod parse;
pub mod scope;
pub mod validate;

pub use error::{GrantError, RejectionReason};
pub use grant::CapabilityGrant;
pub use parse::parse_grant;
pub use scope::{permits, scope_matches, Permission, Scope};
pub use validate::{validate, ValidGrant, ValidationPolicy};
