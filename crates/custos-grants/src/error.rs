//! Grant error taxonomy
//!
//! [`GrantError`] covers decode failures before any trust decision;
//! [`RejectionReason`] covers validation verdicts. Both terminate the
//! request with no data access.

/// Errors from grant parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    /// The wire bytes do not decode into a well-typed grant
    #[error("Malformed grant: {message}")]
    Malformed {
        /// Description of the decode failure
        message: String,
    },
}

impl GrantError {
    /// Create a malformed-grant error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Why a structurally valid grant was rejected.
///
/// Validation short-circuits: the first failing check is the reported
/// reason. The caller logs the rejection as a `token_rejected` audit entry
/// with [`RejectionReason::code`] as a detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    /// The grant subject is not this agent's public key
    #[error("Grant subject does not match this agent")]
    WrongSubject,

    /// The grant's expiry time is not in the future
    #[error("Grant has expired")]
    Expired,

    /// The issuer signature is missing (under a require-signature policy),
    /// unverifiable, or does not verify
    #[error("Grant signature is invalid")]
    BadSignature,

    /// The grant's scopes are malformed, or the requested access is not
    /// covered by any scope
    #[error("Grant scope denies the requested access")]
    ScopeDenied,
}

impl RejectionReason {
    /// Stable snake_case code recorded in audit entries.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::WrongSubject => "wrong_subject",
            RejectionReason::Expired => "expired",
            RejectionReason::BadSignature => "bad_signature",
            RejectionReason::ScopeDenied => "scope_denied",
        }
    }
}
