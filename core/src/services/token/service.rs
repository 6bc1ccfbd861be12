//! Main token service implementation

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::token::{SubjectType, TokenPair, TokenPayload, TokenSubject, TokenType};
use crate::errors::{DomainResult, TokenError, ValidationError};
use crate::repositories::{IdentityRepository, RevocationStore};

use super::codec::{self, EncodedToken, TokenCodec, VerificationError};
use super::config::TokenServiceConfig;
use super::rate_limiter::{IssuanceRateLimiter, RateLimitDecision};

/// Last instant a revocation entry for a token expiring at `exp` is needed
///
/// `exp` has whole-second precision and a token still verifies during the
/// second that starts at `exp`.
pub fn retained_until(exp: DateTime<Utc>) -> DateTime<Utc> {
    exp + chrono::Duration::seconds(1)
}

/// Why a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Expired,
    Invalidated,
    Malformed,
    WrongType,
}

impl From<InvalidReason> for TokenError {
    fn from(reason: InvalidReason) -> Self {
        match reason {
            InvalidReason::Expired => TokenError::ExpiredToken,
            InvalidReason::Invalidated => TokenError::InvalidatedToken,
            InvalidReason::Malformed => TokenError::MalformedToken,
            InvalidReason::WrongType => TokenError::WrongTokenType,
        }
    }
}

/// Result of verifying a presented token
///
/// Rejections are values, not errors: an expired token is an expected
/// outcome. The surrounding `DomainResult` only fails when the revocation
/// store cannot be consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(TokenPayload),
    Invalid(InvalidReason),
}

impl Verification {
    /// Converts into a `Result`, mapping rejections to `TokenError`
    pub fn into_result(self) -> Result<TokenPayload, TokenError> {
        match self {
            Verification::Valid(payload) => Ok(payload),
            Verification::Invalid(reason) => Err(reason.into()),
        }
    }
}

/// SHA-256 digest of a token string, hex encoded
///
/// The revocation set and logs only ever see this digest.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Service issuing, verifying, rotating and revoking token pairs
pub struct TokenService<S: RevocationStore, L: IssuanceRateLimiter> {
    revocations: Arc<S>,
    rate_limiter: Arc<L>,
    codec: TokenCodec,
    config: TokenServiceConfig,
}

impl<S: RevocationStore, L: IssuanceRateLimiter> TokenService<S, L> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `revocations` - Revocation set shared with the cleanup service
    /// * `rate_limiter` - Per-identity issuance limiter
    /// * `config` - Token service configuration
    pub fn new(revocations: Arc<S>, rate_limiter: Arc<L>, config: TokenServiceConfig) -> Self {
        let codec = TokenCodec::new(config.algorithm, config.issuer.clone(), config.audience.clone());
        Self {
            revocations,
            rate_limiter,
            codec,
            config,
        }
    }

    /// Service configuration
    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issues a fresh token pair, starting a new session
    ///
    /// # Arguments
    ///
    /// * `subject` - Identity data to embed; `subject_id` and `subject_type`
    ///   must be non-empty
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The generated token pair
    /// * `Err(ValidationError)` - Subject incomplete; nothing was signed
    /// * `Err(TokenError::RateLimited)` - Too many issuances in the window
    pub async fn issue_pair(&self, subject: &TokenSubject) -> DomainResult<TokenPair> {
        let subject_type = validate_subject(subject)?;

        if self.config.rate_limit_enabled {
            let key = format!("token_issue:{}", subject.subject_id);
            match self.rate_limiter.check_and_record(&key).await? {
                RateLimitDecision::Allowed { remaining } => {
                    debug!(subject_id = %subject.subject_id, remaining, "Issuance allowed");
                }
                RateLimitDecision::Limited { retry_after_seconds } => {
                    warn!(
                        subject_id = %subject.subject_id,
                        retry_after_seconds,
                        "Token issuance rate limit exceeded"
                    );
                    return Err(TokenError::RateLimited { retry_after_seconds }.into());
                }
            }
        }

        let session_id = Uuid::new_v4().to_string();
        let pair = self.mint_pair(subject, subject_type, &session_id, Utc::now().timestamp())?;

        info!(
            subject_id = %subject.subject_id,
            session_id = %pair.session_id,
            "Issued token pair"
        );
        Ok(pair)
    }

    /// Verifies an access token
    ///
    /// Revocation is consulted whenever the signature is valid.
    pub async fn verify_access(&self, token: &str) -> DomainResult<Verification> {
        self.verify(token, TokenType::Access).await
    }

    /// Verifies a refresh token
    pub async fn verify_refresh(&self, token: &str) -> DomainResult<Verification> {
        self.verify(token, TokenType::Refresh).await
    }

    async fn verify(&self, token: &str, expected: TokenType) -> DomainResult<Verification> {
        let (secret, other_secret, other_type) = match expected {
            TokenType::Access => (&self.config.access_secret, &self.config.refresh_secret, TokenType::Refresh),
            TokenType::Refresh => (&self.config.refresh_secret, &self.config.access_secret, TokenType::Access),
        };

        let payload = match self.codec.verify(token, secret, expected) {
            Ok(payload) => payload,
            Err(VerificationError::Expired) => return Ok(Verification::Invalid(InvalidReason::Expired)),
            Err(VerificationError::WrongType { .. }) => {
                return Ok(Verification::Invalid(InvalidReason::WrongType))
            }
            Err(VerificationError::SignatureMismatch) => {
                // Each token type has its own secret, so a token of the other
                // type only verifies under the other secret.
                let reason = match self.codec.verify(token, other_secret, other_type) {
                    Ok(_) | Err(VerificationError::Expired) => InvalidReason::WrongType,
                    Err(_) => InvalidReason::Malformed,
                };
                return Ok(Verification::Invalid(reason));
            }
            Err(VerificationError::Malformed) => return Ok(Verification::Invalid(InvalidReason::Malformed)),
        };

        if self.revocations.is_revoked(&token_digest(token)).await? {
            debug!(session_id = %payload.session_id, token_type = %expected, "Revoked token presented");
            return Ok(Verification::Invalid(InvalidReason::Invalidated));
        }

        Ok(Verification::Valid(payload))
    }

    /// Exchanges a refresh token for a new pair (with rotation)
    ///
    /// The presented token is claimed through an atomic insert into the
    /// revocation set before the new pair is minted, so of two concurrent
    /// rotations of the same token only one succeeds and any replay fails
    /// with `InvalidatedToken`. Rotation does not count against the
    /// issuance rate limit.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The refresh token being exchanged
    /// * `identities` - Source of the live identity record
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - New pair in the same session
    /// * `Err(TokenError)` - Rejected: expired, invalidated, malformed, wrong
    ///   type, identity inactive or session too old
    pub async fn rotate<I>(&self, refresh_token: &str, identities: &I) -> DomainResult<TokenPair>
    where
        I: IdentityRepository + ?Sized,
    {
        let payload = match self.verify_refresh(refresh_token).await? {
            Verification::Valid(payload) => payload,
            Verification::Invalid(reason) => {
                debug!(?reason, "Refresh token rejected");
                return Err(TokenError::from(reason).into());
            }
        };

        let now = Utc::now();
        let identity = identities
            .find_by_id(&payload.sub)
            .await?
            .ok_or(TokenError::IdentityInactive)?;

        if !identity.is_active_at(now) {
            warn!(subject_id = %identity.subject_id, status = ?identity.status, "Rotation refused for inactive identity");
            return Err(TokenError::IdentityInactive.into());
        }

        if identity.token_version != payload.token_version {
            info!(subject_id = %identity.subject_id, "Rotation refused, sessions were invalidated");
            return Err(TokenError::InvalidatedToken.into());
        }

        if let Some(max_age) = self.config.max_session_age {
            if now.timestamp() - payload.auth_time > max_age.num_seconds() {
                info!(session_id = %payload.session_id, "Session exceeded maximum age");
                return Err(TokenError::ReauthenticationRequired.into());
            }
        }

        let expires_at = payload
            .expires_at()
            .map_or(now + self.config.refresh_ttl, retained_until);
        if !self.revocations.revoke(&token_digest(refresh_token), expires_at).await? {
            warn!(session_id = %payload.session_id, "Refresh token already consumed");
            return Err(TokenError::InvalidatedToken.into());
        }

        let pair = self.mint_pair(
            &identity.token_subject(),
            identity.subject_type,
            &payload.session_id,
            payload.auth_time,
        )?;

        info!(
            subject_id = %identity.subject_id,
            session_id = %pair.session_id,
            "Rotated token pair"
        );
        Ok(pair)
    }

    /// Revokes a token until its natural expiry
    ///
    /// Idempotent. The entry is kept until one second past the token's own
    /// `exp` when it can be read, otherwise for a full refresh lifetime; never
    /// longer than that from now.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The token was newly revoked
    /// * `Ok(false)` - The token was already revoked
    pub async fn revoke(&self, token: &str) -> DomainResult<bool> {
        let cap = retained_until(Utc::now() + self.config.refresh_ttl);
        let expires_at = codec::decode(token)
            .ok()
            .and_then(|payload| payload.expires_at())
            .map_or(cap, |exp| retained_until(exp).min(cap));

        let newly_revoked = self.revocations.revoke(&token_digest(token), expires_at).await?;
        if newly_revoked {
            debug!(expires_at = %expires_at, "Token revoked");
        }
        Ok(newly_revoked)
    }

    fn mint_pair(
        &self,
        subject: &TokenSubject,
        subject_type: SubjectType,
        session_id: &str,
        auth_time: i64,
    ) -> DomainResult<TokenPair> {
        let access = self.sign(
            TokenPayload::new(subject, subject_type, session_id, TokenType::Access, auth_time),
            &self.config.access_secret,
            self.config.access_ttl,
        )?;
        let refresh = self.sign(
            TokenPayload::new(subject, subject_type, session_id, TokenType::Refresh, auth_time),
            &self.config.refresh_secret,
            self.config.refresh_ttl,
        )?;

        Ok(TokenPair {
            issued_at: timestamp(access.payload.iat)?,
            access_expires_at: timestamp(access.payload.exp)?,
            refresh_expires_at: timestamp(refresh.payload.exp)?,
            access_token: access.token,
            refresh_token: refresh.token,
            session_id: session_id.to_string(),
        })
    }

    fn sign(
        &self,
        payload: TokenPayload,
        secret: &str,
        ttl: chrono::Duration,
    ) -> Result<EncodedToken, TokenError> {
        self.codec.encode(payload, secret, ttl).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            TokenError::TokenGenerationFailed
        })
    }
}

fn validate_subject(subject: &TokenSubject) -> Result<SubjectType, ValidationError> {
    if subject.subject_id.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "subject_id".to_string(),
        });
    }
    if subject.subject_type.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "subject_type".to_string(),
        });
    }
    subject
        .subject_type
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "subject_type".to_string(),
        })
}

fn timestamp(epoch: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(epoch, 0)
        .single()
        .ok_or(TokenError::TokenGenerationFailed)
}
