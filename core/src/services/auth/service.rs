//! Main authentication service implementation

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::entities::identity::{Identity, IdentitySummary};
use crate::domain::entities::token::TokenPair;
use crate::errors::{AuthError, DomainError, DomainResult, TokenError, ValidationError};
use crate::repositories::{IdentityRepository, RevocationStore};
use crate::services::token::{IssuanceRateLimiter, TokenService};

use super::account_lock::AccountLockPolicy;

/// Outcome of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// The authenticated identity
    pub identity: IdentitySummary,
    /// Freshly issued token pair
    pub tokens: TokenPair,
}

/// Authentication service tying identities to the token lifecycle
pub struct AuthService<I, S, L>
where
    I: IdentityRepository,
    S: RevocationStore,
    L: IssuanceRateLimiter,
{
    /// Identity repository
    identities: Arc<I>,
    /// Token service for issuance, rotation and revocation
    tokens: Arc<TokenService<S, L>>,
    /// Brute force protection
    lock_policy: AccountLockPolicy,
}

impl<I, S, L> AuthService<I, S, L>
where
    I: IdentityRepository,
    S: RevocationStore,
    L: IssuanceRateLimiter,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `identities` - Repository holding identity records
    /// * `tokens` - Token service shared with the request middleware
    /// * `lock_policy` - Failed login threshold and lock duration
    pub fn new(
        identities: Arc<I>,
        tokens: Arc<TokenService<S, L>>,
        lock_policy: AccountLockPolicy,
    ) -> Self {
        Self {
            identities,
            tokens,
            lock_policy,
        }
    }

    /// The underlying token service
    pub fn tokens(&self) -> &Arc<TokenService<S, L>> {
        &self.tokens
    }

    /// Authenticate with login and password, starting a new session
    ///
    /// This method:
    /// 1. Looks up the identity by login
    /// 2. Rejects locked, blocked, suspended and pending accounts
    /// 3. Verifies the password against the stored bcrypt hash
    /// 4. Records the failure (possibly locking the account) or clears the counter
    /// 5. Issues a token pair, subject to the issuance rate limit
    ///
    /// # Arguments
    ///
    /// * `login` - Login name
    /// * `password` - Plain text password
    /// * `client_ip` - Optional client IP, used for logging only
    ///
    /// # Returns
    ///
    /// * `Ok(LoginResult)` - Identity summary and token pair
    /// * `Err(DomainError)` - Invalid credentials, account state or rate limit
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        client_ip: Option<&str>,
    ) -> DomainResult<LoginResult> {
        if login.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "login".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let Some(mut identity) = self.identities.find_by_login(login).await? else {
            warn!(client_ip = client_ip.unwrap_or("-"), "Login attempt for unknown account");
            return Err(AuthError::InvalidCredentials {
                attempts_remaining: self.lock_policy.max_failed_attempts,
            }
            .into());
        };

        self.lock_policy.check(&identity, now)?;

        if !verify_password(password, &identity.password_hash).await? {
            let error = self.lock_policy.register_failure(&mut identity, now);
            warn!(
                subject_id = %identity.subject_id,
                client_ip = client_ip.unwrap_or("-"),
                "Login failed"
            );
            self.identities.update(identity).await?;
            return Err(error.into());
        }

        self.lock_policy.register_success(&mut identity, now);
        let identity = self.identities.update(identity).await?;

        let tokens = self.tokens.issue_pair(&identity.token_subject()).await?;

        info!(
            subject_id = %identity.subject_id,
            session_id = %tokens.session_id,
            client_ip = client_ip.unwrap_or("-"),
            "Login succeeded"
        );

        Ok(LoginResult {
            identity: identity.summary(Some(tokens.session_id.clone())),
            tokens,
        })
    }

    /// Current identity behind an access token
    ///
    /// Role and permissions come from the live identity record, not the
    /// token claims.
    pub async fn me(&self, access_token: &str) -> DomainResult<IdentitySummary> {
        let payload = self.tokens.verify_access(access_token).await?.into_result()?;
        let identity = self.live_identity(&payload.sub).await?;

        if identity.token_version != payload.token_version {
            return Err(TokenError::InvalidatedToken.into());
        }

        Ok(identity.summary(Some(payload.session_id)))
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        self.tokens.rotate(refresh_token, self.identities.as_ref()).await
    }

    /// Revoke whichever tokens are supplied
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of tokens newly revoked
    pub async fn logout(
        &self,
        refresh_token: Option<&str>,
        access_token: Option<&str>,
    ) -> DomainResult<usize> {
        let mut revoked = 0;
        for token in [refresh_token, access_token].into_iter().flatten() {
            if self.tokens.revoke(token).await? {
                revoked += 1;
            }
        }

        debug!(revoked, "Logout processed");
        Ok(revoked)
    }

    async fn live_identity(&self, subject_id: &str) -> DomainResult<Identity> {
        let identity = self
            .identities
            .find_by_id(subject_id)
            .await?
            .ok_or(TokenError::IdentityInactive)?;

        if !identity.is_active_at(Utc::now()) {
            return Err(TokenError::IdentityInactive.into());
        }
        Ok(identity)
    }
}

/// bcrypt verification off the async executor
async fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    if hash.is_empty() {
        return Ok(false);
    }

    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::internal(format!("Password check aborted: {}", e)))?
        .map_err(|e| DomainError::internal(format!("Invalid password hash: {}", e)))
}
