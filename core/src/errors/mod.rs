//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, TokenError, ValidationError};

use sg_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),
}

impl DomainError {
    /// Shorthand for storage and infrastructure failures
    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal {
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            DomainError::NotFound { .. } => ErrorResponse::new(error_codes::NOT_FOUND, self.to_string()),
            // Storage details stay in the logs
            DomainError::Internal { .. } => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred")
            }
            DomainError::Auth(err) => err.to_error_response(),
            DomainError::Token(err) => err.to_error_response(),
            DomainError::ValidationErr(err) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, err.to_string())
            }
        }
    }
}

impl IntoErrorResponse for TokenError {
    fn to_error_response(&self) -> ErrorResponse {
        let code = match self {
            TokenError::MalformedToken => error_codes::MALFORMED_TOKEN,
            TokenError::ExpiredToken => error_codes::EXPIRED_TOKEN,
            TokenError::InvalidatedToken => error_codes::INVALIDATED_TOKEN,
            TokenError::WrongTokenType => error_codes::WRONG_TOKEN_TYPE,
            TokenError::IdentityInactive => error_codes::IDENTITY_INACTIVE,
            TokenError::ReauthenticationRequired => error_codes::REAUTHENTICATION_REQUIRED,
            TokenError::NoCredential => error_codes::NO_CREDENTIAL,
            TokenError::TokenGenerationFailed => error_codes::INTERNAL_ERROR,
            TokenError::RateLimited { retry_after_seconds } => {
                return ErrorResponse::new(error_codes::RATE_LIMITED, self.to_string())
                    .add_detail("retry_after_seconds", retry_after_seconds);
            }
        };
        ErrorResponse::new(code, self.to_string())
    }
}

impl IntoErrorResponse for AuthError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            AuthError::InvalidCredentials { attempts_remaining } => {
                ErrorResponse::new(error_codes::INVALID_CREDENTIALS, self.to_string())
                    .add_detail("attempts_remaining", attempts_remaining)
            }
            AuthError::AccountLocked { retry_after_seconds } => {
                ErrorResponse::new(error_codes::ACCOUNT_LOCKED, self.to_string())
                    .add_detail("retry_after_seconds", retry_after_seconds)
            }
            AuthError::AccountBlocked => ErrorResponse::new(error_codes::ACCOUNT_BLOCKED, self.to_string()),
            AuthError::AccountSuspended => {
                ErrorResponse::new(error_codes::ACCOUNT_SUSPENDED, self.to_string())
            }
            AuthError::AccountPending => ErrorResponse::new(error_codes::ACCOUNT_PENDING, self.to_string()),
        }
    }
}
