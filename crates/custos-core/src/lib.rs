//! # Custos Core - Layer 1: Foundation
//!
//! Shared foundation for the Custos capability-token security core.
//!
//! ## Purpose
//!
//! Layer 1 foundation crate providing:
//! - Canonical SHA-256 hashing over serialized values
//! - Session identifiers
//! - Injectable effects (time, randomness) for deterministic testing
//!
//! ## Architecture Constraints
//!
//! This crate depends on no other Custos crate. All time and randomness in
//! higher layers flows through the [`Effects`] system so that every
//! cryptographic and audit operation can be reproduced in tests.

pub mod effects;
pub mod error;
pub mod hash;

pub use effects::{
    Effects, OsRandomSource, RandomSource, SeededRandomSource, SimulatedTimeSource,
    SystemTimeSource, TimeSource,
};
pub use error::{CoreError, Result};
pub use hash::{canonical_digest, sha256_hex, Hash32};

use serde::{Deserialize, Serialize};

/// Identifier for one agent session.
///
/// A session owns exactly one audit chain; a new session always starts a
/// fresh chain under a fresh identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Create a session id from injected randomness.
    pub fn new_with_effects(effects: &Effects) -> Self {
        SessionId(effects.gen_uuid())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
