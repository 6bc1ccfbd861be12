//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;
use sg_shared::config::{JwtConfig, RateLimitConfig};

use crate::domain::entities::token::{JWT_AUDIENCE, JWT_ISSUER};
use crate::errors::{DomainError, DomainResult};

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Secret for access tokens
    pub access_secret: String,
    /// Secret for refresh tokens
    pub refresh_secret: String,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// JWT issuer
    pub issuer: String,
    /// JWT audience
    pub audience: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// Sessions older than this (since login) cannot be rotated
    pub max_session_age: Option<Duration>,
    /// Whether issuance is rate limited per identity
    pub rate_limit_enabled: bool,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            access_secret: "development-access-secret".to_string(),
            refresh_secret: "development-refresh-secret".to_string(),
            algorithm: Algorithm::HS256,
            issuer: JWT_ISSUER.to_string(),
            audience: JWT_AUDIENCE.to_string(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(30),
            max_session_age: None,
            rate_limit_enabled: true,
        }
    }
}

impl TokenServiceConfig {
    /// Build from the shared JWT and rate limit configuration
    ///
    /// Only HMAC algorithms are accepted since tokens are signed with
    /// shared secrets.
    pub fn from_shared(jwt: &JwtConfig, rate_limit: &RateLimitConfig) -> DomainResult<Self> {
        let algorithm = match jwt.algorithm.to_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(DomainError::internal(format!(
                    "Unsupported JWT algorithm: {}",
                    other
                )))
            }
        };

        if jwt.access_secret == jwt.refresh_secret {
            tracing::warn!("Access and refresh tokens share a signing secret");
        }

        Ok(Self {
            access_secret: jwt.access_secret.clone(),
            refresh_secret: jwt.refresh_secret.clone(),
            algorithm,
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_ttl: Duration::seconds(jwt.access_token_expiry),
            refresh_ttl: Duration::seconds(jwt.refresh_token_expiry),
            max_session_age: jwt.max_session_age.map(Duration::seconds),
            rate_limit_enabled: rate_limit.enabled,
        })
    }
}
