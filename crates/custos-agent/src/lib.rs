//! # Custos Agent - Layer 4: Session Runtime
//!
//! Runtime composition for the Custos capability-token security core.
//!
//! ## Purpose
//!
//! Layer 4 crate providing:
//! - [`Session`]: the per-request pipeline parse → validate → unwrap →
//!   decrypt, with one audit entry per transition (rejections included)
//! - Collaborator traits: [`ObjectStore`] (remote ciphertext-only storage)
//!   and [`IssuerDirectory`] (issuer public key lookup)
//! - [`AgentConfig`]: TOML configuration with safe defaults
//!
//! ## Concurrency Model
//!
//! A session is exclusively owned by one request's execution context; the
//! audit chain inside it is never shared. The only state shared across
//! concurrent sessions is the read-only [`custos_crypto::AgentKeyPair`]
//! behind an `Arc`. Cryptographic operations are pure, blocking, and
//! CPU-bound; only object store calls are async.

pub mod config;
pub mod error;
pub mod issuer;
pub mod session;
pub mod startup;
pub mod store;

pub use config::{AgentConfig, ConfigError};
pub use error::AgentError;
pub use issuer::{IssuerDirectory, MemoryIssuerDirectory};
pub use session::Session;
pub use startup::load_agent_keypair;
pub use store::{MemoryObjectStore, ObjectStore, StoreError};
