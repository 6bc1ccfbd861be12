//! Token entities for JWT-based session management.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default JWT issuer
pub const JWT_ISSUER: &str = "sessionguard";

/// Default JWT audience
pub const JWT_AUDIENCE: &str = "sessionguard-api";

/// Kind of token carried in the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Kind of principal a token is issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Admin,
    User,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Admin => "admin",
            SubjectType::User => "user",
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(SubjectType::Admin),
            "user" => Ok(SubjectType::User),
            _ => Err(format!("Invalid subject type: {}", s)),
        }
    }
}

/// Signed token payload
///
/// The temporal claims (`iat`, `nbf`, `exp`), `iss`, `aud` and `jti` are
/// stamped by the codec at signing time; anything set before encoding is
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject (identity ID)
    pub sub: String,

    /// Kind of principal
    pub subject_type: SubjectType,

    /// Role at the time of issuance
    pub role: String,

    /// Permissions at the time of issuance
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Session this token belongs to; stable across rotations
    pub session_id: String,

    /// Access or refresh
    pub token_type: TokenType,

    /// Identity token version; bumping it on the identity invalidates all sessions
    #[serde(default)]
    pub token_version: u32,

    /// Epoch seconds of the login that started the session
    pub auth_time: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Not before timestamp
    #[serde(default)]
    pub nbf: i64,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Audience
    #[serde(default)]
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    #[serde(default)]
    pub jti: String,
}

impl TokenPayload {
    /// Builds an unsigned payload for `subject` within `session_id`
    pub fn new(
        subject: &TokenSubject,
        subject_type: SubjectType,
        session_id: impl Into<String>,
        token_type: TokenType,
        auth_time: i64,
    ) -> Self {
        Self {
            sub: subject.subject_id.clone(),
            subject_type,
            role: subject.role.clone(),
            permissions: subject.permissions.clone(),
            session_id: session_id.into(),
            token_type,
            token_version: subject.token_version,
            auth_time,
            iat: 0,
            nbf: 0,
            exp: 0,
            iss: String::new(),
            aud: String::new(),
            jti: String::new(),
        }
    }

    /// Expiry as a timestamp, `None` if `exp` is out of range
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Checks if the payload has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Remaining lifetime at `now`; negative once expired
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Duration {
        Duration::seconds(self.exp - now.timestamp())
    }
}

/// Everything needed to mint tokens for an identity
///
/// `subject_type` is kept as text because it arrives from callers and
/// repositories unvalidated; issuance rejects empty or unknown values
/// before anything is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSubject {
    pub subject_id: String,
    pub subject_type: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub token_version: u32,
}

/// Access/refresh token pair handed to a client
///
/// Superseded, never mutated, on every rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Session identifier shared by both tokens
    pub session_id: String,

    /// Time the pair was minted
    pub issued_at: DateTime<Utc>,

    /// Access token expiry
    pub access_expires_at: DateTime<Utc>,

    /// Refresh token expiry
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPair {
    /// Seconds until the access token expires, clamped at zero
    pub fn access_expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.access_expires_at - now).num_seconds().max(0)
    }

    /// Seconds until the refresh token expires, clamped at zero
    pub fn refresh_expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.refresh_expires_at - now).num_seconds().max(0)
    }
}
