//! Audit chain error type

use custos_core::CoreError;

/// Errors from audit chain operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuditError {
    /// Canonical serialization of an entry failed
    #[error("Audit serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },

    /// The time source could not produce a timestamp
    #[error("Audit time error: {message}")]
    Time {
        /// Description of the time source failure
        message: String,
    },
}

impl From<CoreError> for AuditError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Serialization { message } => AuditError::Serialization { message },
            CoreError::Time { message } => AuditError::Time { message },
        }
    }
}
