//! Token codec: signs, inspects and verifies token payloads as JWTs.
//!
//! The codec is pure; it holds no state beyond its algorithm and the
//! issuer/audience it stamps and checks.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::token::{TokenPayload, TokenType};

/// Failure to sign a payload
#[derive(Debug, Error)]
#[error("Failed to sign token: {0}")]
pub struct EncodeError(#[from] jsonwebtoken::errors::Error);

/// Failure to read a token without verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Malformed token")]
pub struct DecodeError;

/// Reasons a token fails verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Expected a {expected} token")]
    WrongType { expected: TokenType },
}

/// A freshly signed token together with the claims that were signed
#[derive(Debug, Clone)]
pub struct EncodedToken {
    pub token: String,
    pub payload: TokenPayload,
}

/// JWT codec bound to one algorithm, issuer and audience
#[derive(Debug, Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    /// Creates a codec
    ///
    /// # Arguments
    ///
    /// * `algorithm` - HMAC algorithm used for signing (HS256/384/512)
    /// * `issuer` - Value stamped into and required in `iss`
    /// * `audience` - Value stamped into and required in `aud`
    pub fn new(algorithm: Algorithm, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            algorithm,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Signs `payload` with `secret`, valid for `ttl` from now
    ///
    /// Stamps `iat`, `nbf`, `exp = iat + ttl`, `iss`, `aud` and a fresh `jti`.
    ///
    /// # Returns
    ///
    /// * `Ok(EncodedToken)` - The compact token and the claims it carries
    /// * `Err(EncodeError)` - Signing failed
    pub fn encode(
        &self,
        mut payload: TokenPayload,
        secret: &str,
        ttl: Duration,
    ) -> Result<EncodedToken, EncodeError> {
        let now = Utc::now().timestamp();
        payload.iat = now;
        payload.nbf = now;
        payload.exp = now + ttl.num_seconds();
        payload.iss = self.issuer.clone();
        payload.aud = self.audience.clone();
        payload.jti = Uuid::new_v4().to_string();

        let token = jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(EncodedToken { token, payload })
    }

    /// Verifies signature, issuer, audience and expiry, then the token type
    ///
    /// The signature is checked before any claim is looked at, so a forged
    /// token reports `SignatureMismatch` even when it is also expired or
    /// carries the wrong type.
    pub fn verify(
        &self,
        token: &str,
        secret: &str,
        expected_type: TokenType,
    ) -> Result<TokenPayload, VerificationError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<TokenPayload>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => VerificationError::Expired,
            ErrorKind::InvalidSignature => VerificationError::SignatureMismatch,
            _ => VerificationError::Malformed,
        })?;

        if data.claims.token_type != expected_type {
            return Err(VerificationError::WrongType {
                expected: expected_type,
            });
        }

        Ok(data.claims)
    }
}

/// Reads a token's payload without checking its signature or expiry.
///
/// Only for unauthenticated inspection, e.g. a client deciding when to
/// refresh. Nothing read here may be trusted for authorization.
pub fn decode(token: &str) -> Result<TokenPayload, DecodeError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    jsonwebtoken::decode::<TokenPayload>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| DecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::token::{SubjectType, TokenSubject};

    const SECRET: &str = "codec-test-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(Algorithm::HS256, "sessionguard", "sessionguard-api")
    }

    fn payload(token_type: TokenType) -> TokenPayload {
        let subject = TokenSubject {
            subject_id: "u-1".into(),
            subject_type: "user".into(),
            role: "member".into(),
            permissions: vec![],
            token_version: 0,
        };
        TokenPayload::new(&subject, SubjectType::User, "session-1", token_type, 1_700_000_000)
    }

    #[test]
    fn test_encode_stamps_temporal_claims() {
        let encoded = codec()
            .encode(payload(TokenType::Access), SECRET, Duration::seconds(3600))
            .unwrap();

        assert_eq!(encoded.payload.exp - encoded.payload.iat, 3600);
        assert_eq!(encoded.payload.iss, "sessionguard");
        assert_eq!(encoded.payload.aud, "sessionguard-api");
        assert!(!encoded.payload.jti.is_empty());
        assert_eq!(encoded.token.split('.').count(), 3);
    }

    #[test]
    fn test_tokens_minted_in_same_second_differ() {
        let a = codec().encode(payload(TokenType::Access), SECRET, Duration::hours(1)).unwrap();
        let b = codec().encode(payload(TokenType::Access), SECRET, Duration::hours(1)).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_verify_valid_token() {
        let encoded = codec().encode(payload(TokenType::Refresh), SECRET, Duration::days(1)).unwrap();
        let verified = codec().verify(&encoded.token, SECRET, TokenType::Refresh).unwrap();
        assert_eq!(verified, encoded.payload);
    }

    #[test]
    fn test_verify_expired_token() {
        let encoded = codec().encode(payload(TokenType::Access), SECRET, Duration::seconds(-10)).unwrap();
        assert_eq!(
            codec().verify(&encoded.token, SECRET, TokenType::Access),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn test_signature_checked_before_claims() {
        let encoded = codec().encode(payload(TokenType::Access), SECRET, Duration::seconds(-10)).unwrap();
        assert_eq!(
            codec().verify(&encoded.token, "other-secret", TokenType::Refresh),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_wrong_type() {
        let encoded = codec().encode(payload(TokenType::Access), SECRET, Duration::hours(1)).unwrap();
        assert_eq!(
            codec().verify(&encoded.token, SECRET, TokenType::Refresh),
            Err(VerificationError::WrongType { expected: TokenType::Refresh })
        );
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let foreign = TokenCodec::new(Algorithm::HS256, "someone-else", "sessionguard-api");
        let encoded = foreign.encode(payload(TokenType::Access), SECRET, Duration::hours(1)).unwrap();
        assert_eq!(
            codec().verify(&encoded.token, SECRET, TokenType::Access),
            Err(VerificationError::Malformed)
        );
    }

    #[test]
    fn test_verify_garbage() {
        assert_eq!(
            codec().verify("not-a-jwt", SECRET, TokenType::Access),
            Err(VerificationError::Malformed)
        );
    }

    #[test]
    fn test_decode_ignores_signature_and_expiry() {
        let encoded = codec().encode(payload(TokenType::Access), SECRET, Duration::seconds(-100)).unwrap();
        let decoded = decode(&encoded.token).unwrap();
        assert_eq!(decoded.session_id, "session-1");
        assert_eq!(decoded.exp, encoded.payload.exp);
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(decode("a.b"), Err(DecodeError));
        assert_eq!(decode(""), Err(DecodeError));
    }
}
