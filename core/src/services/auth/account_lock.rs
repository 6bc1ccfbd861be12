//! Account lock policy for brute force protection
//!
//! Failed logins are counted on the identity record itself. Reaching the
//! threshold locks the account for a fixed duration and resets the counter;
//! a successful login clears both.

use chrono::{DateTime, Duration, Utc};
use sg_shared::config::rate_limit::AuthRateLimits;
use tracing::{info, warn};

use crate::domain::entities::identity::{Identity, IdentityStatus};
use crate::errors::AuthError;

/// Configuration for account locking
#[derive(Debug, Clone)]
pub struct AccountLockPolicy {
    /// Maximum failed attempts before locking (default: 5)
    pub max_failed_attempts: u32,
    /// How long an account remains locked (default: 30 minutes)
    pub lock_duration: Duration,
}

impl Default for AccountLockPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

impl From<&AuthRateLimits> for AccountLockPolicy {
    fn from(limits: &AuthRateLimits) -> Self {
        Self {
            max_failed_attempts: limits.failed_attempts_threshold.max(1),
            lock_duration: Duration::seconds(limits.account_lock_duration as i64),
        }
    }
}

impl AccountLockPolicy {
    /// Check whether `identity` may attempt a login at `now`
    ///
    /// An expired temporary lock passes; it is cleared by the next
    /// `register_success` or `register_failure`.
    ///
    /// # Returns
    /// * `Ok(())` - Login may proceed to password verification
    /// * `Err(AuthError)` - Account locked, blocked, suspended or pending
    pub fn check(&self, identity: &Identity, now: DateTime<Utc>) -> Result<(), AuthError> {
        match identity.status {
            IdentityStatus::Active => Ok(()),
            IdentityStatus::Locked if identity.is_locked_at(now) => Err(AuthError::AccountLocked {
                retry_after_seconds: identity
                    .locked_until
                    .map_or(self.lock_duration.num_seconds(), |until| {
                        (until - now).num_seconds().max(1)
                    }),
            }),
            IdentityStatus::Locked => Ok(()),
            IdentityStatus::Blocked => Err(AuthError::AccountBlocked),
            IdentityStatus::Suspended => Err(AuthError::AccountSuspended),
            IdentityStatus::Pending => Err(AuthError::AccountPending),
        }
    }

    /// Record a failed password check on `identity`
    ///
    /// # Returns
    /// The error to report: `AccountLocked` when this failure reached the
    /// threshold, otherwise `InvalidCredentials` with the attempts left.
    pub fn register_failure(&self, identity: &mut Identity, now: DateTime<Utc>) -> AuthError {
        if identity.status == IdentityStatus::Locked {
            // Lock has lapsed, start counting afresh
            identity.status = IdentityStatus::Active;
            identity.locked_until = None;
        }

        identity.failed_login_attempts += 1;

        if identity.failed_login_attempts >= self.max_failed_attempts {
            identity.status = IdentityStatus::Locked;
            identity.locked_until = Some(now + self.lock_duration);
            identity.failed_login_attempts = 0;

            info!(
                subject_id = %identity.subject_id,
                duration_seconds = self.lock_duration.num_seconds(),
                "Account locked due to failed login attempts"
            );

            return AuthError::AccountLocked {
                retry_after_seconds: self.lock_duration.num_seconds(),
            };
        }

        let attempts_remaining = self.max_failed_attempts - identity.failed_login_attempts;
        warn!(
            subject_id = %identity.subject_id,
            attempts = identity.failed_login_attempts,
            max_attempts = self.max_failed_attempts,
            "Failed login attempt recorded"
        );

        AuthError::InvalidCredentials { attempts_remaining }
    }

    /// Reset counters after a successful login
    pub fn register_success(&self, identity: &mut Identity, now: DateTime<Utc>) {
        if identity.status == IdentityStatus::Locked {
            identity.status = IdentityStatus::Active;
        }
        identity.locked_until = None;
        identity.failed_login_attempts = 0;
        identity.last_login_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::token::SubjectType;

    fn identity() -> Identity {
        Identity::new("u-1", SubjectType::User, "alice", "hash", "member")
    }

    #[test]
    fn test_failures_count_down_then_lock() {
        let policy = AccountLockPolicy::default();
        let mut identity = identity();
        let now = Utc::now();

        for remaining in (1..5).rev() {
            assert_eq!(
                policy.register_failure(&mut identity, now),
                AuthError::InvalidCredentials { attempts_remaining: remaining }
            );
        }

        assert_eq!(
            policy.register_failure(&mut identity, now),
            AuthError::AccountLocked { retry_after_seconds: 1800 }
        );
        assert_eq!(identity.status, IdentityStatus::Locked);
        assert_eq!(identity.failed_login_attempts, 0);
        assert!(policy.check(&identity, now + Duration::minutes(10)).is_err());
        assert!(policy.check(&identity, now + Duration::minutes(31)).is_ok());
    }

    #[test]
    fn test_lock_reports_remaining_time() {
        let policy = AccountLockPolicy::default();
        let now = Utc::now();
        let mut identity = identity();
        identity.status = IdentityStatus::Locked;
        identity.locked_until = Some(now + Duration::seconds(90));

        assert_eq!(
            policy.check(&identity, now),
            Err(AuthError::AccountLocked { retry_after_seconds: 90 })
        );
    }

    #[test]
    fn test_administrative_statuses() {
        let policy = AccountLockPolicy::default();
        let now = Utc::now();
        let mut identity = identity();

        identity.status = IdentityStatus::Blocked;
        assert_eq!(policy.check(&identity, now), Err(AuthError::AccountBlocked));
        identity.status = IdentityStatus::Suspended;
        assert_eq!(policy.check(&identity, now), Err(AuthError::AccountSuspended));
        identity.status = IdentityStatus::Pending;
        assert_eq!(policy.check(&identity, now), Err(AuthError::AccountPending));
    }

    #[test]
    fn test_success_clears_lapsed_lock() {
        let policy = AccountLockPolicy::default();
        let now = Utc::now();
        let mut identity = identity();
        identity.status = IdentityStatus::Locked;
        identity.locked_until = Some(now - Duration::seconds(1));
        identity.failed_login_attempts = 3;

        policy.register_success(&mut identity, now);

        assert_eq!(identity.status, IdentityStatus::Active);
        assert_eq!(identity.locked_until, None);
        assert_eq!(identity.failed_login_attempts, 0);
        assert_eq!(identity.last_login_at, Some(now));
    }

    #[test]
    fn test_policy_from_shared_limits() {
        let limits = AuthRateLimits {
            failed_attempts_threshold: 3,
            account_lock_duration: 600,
        };
        let policy = AccountLockPolicy::from(&limits);
        assert_eq!(policy.max_failed_attempts, 3);
        assert_eq!(policy.lock_duration, Duration::minutes(10));
    }
}
