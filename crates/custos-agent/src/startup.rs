//! Agent process startup
//!
//! The keypair store is consulted exactly once, at process start; every
//! session then shares the loaded keypair read-only. A corrupt record is
//! fatal here: proceeding with a regenerated identity would orphan every
//! outstanding grant.

use crate::config::AgentConfig;
use crate::error::AgentError;
use custos_core::Effects;
use custos_crypto::{AgentKeyPair, KeyPairStore};
use std::sync::Arc;

/// Load (or lazily create) the agent keypair named by the configuration.
pub fn load_agent_keypair(
    config: &AgentConfig,
    effects: &Effects,
) -> Result<Arc<AgentKeyPair>, AgentError> {
    let store = KeyPairStore::new(config.keystore_path.clone(), effects.clone());
    let keypair = store.get_or_create()?;
    Ok(Arc::new(keypair))
}
