//! Core error type shared by the foundation utilities

/// Errors from foundation operations (hashing, effects).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// Canonical serialization of a value failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },

    /// A time source could not produce a timestamp
    #[error("Time error: {message}")]
    Time {
        /// Description of the time source failure
        message: String,
    },
}

impl CoreError {
    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a time source error
    pub fn time(message: impl Into<String>) -> Self {
        Self::Time {
            message: message.into(),
        }
    }
}

/// Standard Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
