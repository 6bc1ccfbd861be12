use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use sg_core::{IdentitySummary, TokenPair};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub login: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Token lifetimes without the tokens themselves; those travel as cookies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    /// seconds until the access token expires
    pub expires_in: i64,
}

impl SessionResponse {
    pub fn from_pair(pair: &TokenPair, now: DateTime<Utc>) -> Self {
        Self {
            session_id: pair.session_id.clone(),
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
            expires_in: pair.access_expires_in(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub identity: IdentitySummary,
    pub session: SessionResponse,
}

/// Rotation result; also carries the pair for clients without a cookie jar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(flatten)]
    pub session: SessionResponse,
}

impl TokenResponse {
    pub fn from_pair(pair: &TokenPair, now: DateTime<Utc>) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            session: SessionResponse::from_pair(pair, now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}
