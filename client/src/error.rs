//! Client-side error taxonomy

use reqwest::StatusCode;
use thiserror::Error;

use sg_core::TokenError;
use sg_shared::{error_codes, ErrorResponse};

/// Errors surfaced by the token manager
///
/// `Clone` because one refresh outcome is handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The breaker is open; no network call was made
    #[error("Circuit open, authentication calls suspended")]
    CircuitOpen,

    /// Neither a local token nor a server session is available
    #[error("No credential available")]
    NoCredential,

    /// The server refused the credential
    #[error("Rejected by server: {0}")]
    Rejected(TokenError),

    /// A probe or call exceeded its deadline
    #[error("Request timed out")]
    Timeout,

    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Response that is neither success nor a known rejection
    #[error("Unexpected HTTP status {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Retries are exhausted and the deferred attempt has not run yet
    #[error("Refresh cooling down, next attempt in {retry_in_seconds} seconds")]
    CoolingDown { retry_in_seconds: u64 },
}

impl ClientError {
    /// Whether backing off and trying again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout | ClientError::Network(_) => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            ClientError::Rejected(error) => matches!(
                error,
                TokenError::RateLimited { .. } | TokenError::TokenGenerationFailed
            ),
            ClientError::CircuitOpen
            | ClientError::NoCredential
            | ClientError::Decode(_)
            | ClientError::CoolingDown { .. } => false,
        }
    }

    /// Whether only a fresh login can recover
    pub fn requires_reauthentication(&self) -> bool {
        match self {
            ClientError::NoCredential => true,
            ClientError::Rejected(error) => !matches!(
                error,
                TokenError::RateLimited { .. } | TokenError::TokenGenerationFailed
            ),
            _ => false,
        }
    }

    /// Whether the failure says something about the server's health
    ///
    /// Rejections are answers from a healthy server and do not count
    /// against the circuit breaker.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            ClientError::Timeout | ClientError::Network(_) => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map an error response from the auth server
    pub fn from_response(status: StatusCode, body: Option<ErrorResponse>) -> Self {
        let Some(body) = body else {
            return ClientError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            };
        };

        let token_error = match body.error.as_str() {
            error_codes::MALFORMED_TOKEN => Some(TokenError::MalformedToken),
            error_codes::EXPIRED_TOKEN => Some(TokenError::ExpiredToken),
            error_codes::INVALIDATED_TOKEN => Some(TokenError::InvalidatedToken),
            error_codes::WRONG_TOKEN_TYPE => Some(TokenError::WrongTokenType),
            error_codes::IDENTITY_INACTIVE => Some(TokenError::IdentityInactive),
            error_codes::REAUTHENTICATION_REQUIRED => Some(TokenError::ReauthenticationRequired),
            error_codes::NO_CREDENTIAL => Some(TokenError::NoCredential),
            error_codes::RATE_LIMITED => Some(TokenError::RateLimited {
                retry_after_seconds: body.detail_u64("retry_after_seconds").unwrap_or(0),
            }),
            _ => None,
        };

        match token_error {
            Some(error) => ClientError::Rejected(error),
            None => ClientError::Http {
                status: status.as_u16(),
                message: body.message,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Network(error.to_string())
        }
    }
}
