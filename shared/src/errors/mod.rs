//! Error envelope shared by the server and the client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JSON body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error details (attempts remaining, retry delay, field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a detail; values that fail to serialize are skipped
    pub fn add_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.details
                .get_or_insert_with(HashMap::new)
                .insert(key.into(), value);
        }
        self
    }

    /// Numeric detail, e.g. `retry_after_seconds`
    pub fn detail_u64(&self, key: &str) -> Option<u64> {
        self.details.as_ref()?.get(key)?.as_u64()
    }
}

/// Stable error codes returned by the HTTP surface
pub mod error_codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NO_CREDENTIAL: &str = "no_credential";
    pub const MALFORMED_TOKEN: &str = "malformed_token";
    pub const EXPIRED_TOKEN: &str = "expired_token";
    pub const INVALIDATED_TOKEN: &str = "invalidated_token";
    pub const WRONG_TOKEN_TYPE: &str = "wrong_token_type";
    pub const IDENTITY_INACTIVE: &str = "identity_inactive";
    pub const REAUTHENTICATION_REQUIRED: &str = "reauthentication_required";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const ACCOUNT_LOCKED: &str = "locked";
    pub const ACCOUNT_BLOCKED: &str = "blocked";
    pub const ACCOUNT_SUSPENDED: &str = "suspended";
    pub const ACCOUNT_PENDING: &str = "pending";
}

/// Trait for converting errors to ErrorResponse
pub trait IntoErrorResponse {
    fn to_error_response(&self) -> ErrorResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_detail_serializes_value() {
        let response = ErrorResponse::new(error_codes::INVALID_CREDENTIALS, "Wrong password")
            .add_detail("attempts_remaining", 3);

        let details = response.details.unwrap();
        assert_eq!(details["attempts_remaining"], serde_json::json!(3));
    }

    #[test]
    fn test_detail_u64_reads_numbers_only() {
        let response = ErrorResponse::new(error_codes::RATE_LIMITED, "slow down")
            .add_detail("retry_after_seconds", 42)
            .add_detail("hint", "wait");

        assert_eq!(response.detail_u64("retry_after_seconds"), Some(42));
        assert_eq!(response.detail_u64("hint"), None);
        assert_eq!(response.detail_u64("missing"), None);
    }

    #[test]
    fn test_details_omitted_when_empty() {
        let json = serde_json::to_value(ErrorResponse::new(error_codes::UNAUTHORIZED, "no")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["error"], "UNAUTHORIZED");
    }
}
