//! Agent configuration
//!
//! Loaded from TOML with serde defaults. The signature requirement
//! defaults to on: accepting unsigned grants is a deliberate,
//! configuration-visible weakening, never an accident of a missing file.

use custos_grants::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the Custos agent process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Where the persisted keypair record lives
    pub keystore_path: PathBuf,
    /// Whether grants must carry a verifiable issuer signature
    pub require_signature: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            keystore_path: default_keystore_path(),
            require_signature: true,
        }
    }
}

impl AgentConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The validation policy implied by this configuration.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            require_signature: self.require_signature,
        }
    }
}

/// Default keypair location under the platform data directory.
fn default_keystore_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("custos")
        .join("agent_keys.json")
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text did not parse
    #[error("Config parse failed: {message}")]
    Parse {
        /// Description of the parse failure
        message: String,
    },
}
