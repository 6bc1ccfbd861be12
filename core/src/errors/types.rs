//! Domain-specific error types for token lifecycle and login operations
//!
//! Messages are English only; the presentation layer maps each variant to a
//! stable error code.

use thiserror::Error;

/// Token lifecycle errors
///
/// Verification failures are reported, never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token has been invalidated")]
    InvalidatedToken,

    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Too many token requests, retry in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Identity is no longer active")]
    IdentityInactive,

    #[error("Session too old, re-authentication required")]
    ReauthenticationRequired,

    #[error("No credential presented")]
    NoCredential,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

impl TokenError {
    /// Whether the caller has to log in again to recover
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidatedToken
                | TokenError::IdentityInactive
                | TokenError::ReauthenticationRequired
        )
    }
}

/// Login errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials { attempts_remaining: u32 },

    #[error("Account locked, retry in {retry_after_seconds} seconds")]
    AccountLocked { retry_after_seconds: i64 },

    #[error("Account blocked")]
    AccountBlocked,

    #[error("Account suspended")]
    AccountSuspended,

    #[error("Account pending activation")]
    AccountPending,
}

/// Validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reauthentication_classification() {
        assert!(TokenError::InvalidatedToken.requires_reauthentication());
        assert!(TokenError::IdentityInactive.requires_reauthentication());
        assert!(TokenError::ReauthenticationRequired.requires_reauthentication());
        assert!(!TokenError::ExpiredToken.requires_reauthentication());
        assert!(!TokenError::RateLimited { retry_after_seconds: 5 }.requires_reauthentication());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TokenError::RateLimited { retry_after_seconds: 42 }.to_string(),
            "Too many token requests, retry in 42 seconds"
        );
        assert_eq!(
            ValidationError::RequiredField { field: "subject_type".into() }.to_string(),
            "Required field: subject_type"
        );
    }
}
