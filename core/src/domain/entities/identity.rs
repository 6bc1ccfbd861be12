//! Identity entity: the principal tokens are issued to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::{SubjectType, TokenSubject};

/// Account status of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    /// May log in and rotate tokens
    Active,
    /// Temporarily locked after repeated failed logins, see `locked_until`
    Locked,
    /// Blocked by an administrator
    Blocked,
    /// Suspended by an administrator
    Suspended,
    /// Registered but not yet activated
    Pending,
}

/// Identity record as seen by the token subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identity ID
    pub subject_id: String,

    /// Kind of principal
    pub subject_type: SubjectType,

    /// Login name
    pub login: String,

    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Current role
    pub role: String,

    /// Current permissions
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Account status
    pub status: IdentityStatus,

    /// Bumped to invalidate every outstanding session of this identity
    #[serde(default)]
    pub token_version: u32,

    /// Consecutive failed logins since the last success or lock
    #[serde(default)]
    pub failed_login_attempts: u32,

    /// End of the current temporary lock
    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,

    /// Timestamp of last successful login
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Creates a new active identity
    pub fn new(
        subject_id: impl Into<String>,
        subject_type: SubjectType,
        login: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_type,
            login: login.into(),
            password_hash: password_hash.into(),
            role: role.into(),
            permissions: Vec::new(),
            status: IdentityStatus::Active,
            token_version: 0,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
        }
    }

    /// Sets the permissions
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a temporary lock is in force at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.status == IdentityStatus::Locked && self.locked_until.map_or(true, |until| until > now)
    }

    /// Whether the identity may hold a live session at `now`.
    ///
    /// An expired temporary lock counts as active.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            IdentityStatus::Active => true,
            IdentityStatus::Locked => !self.is_locked_at(now),
            IdentityStatus::Blocked | IdentityStatus::Suspended | IdentityStatus::Pending => false,
        }
    }

    /// Input for token issuance reflecting the current role and permissions
    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            subject_id: self.subject_id.clone(),
            subject_type: self.subject_type.to_string(),
            role: self.role.clone(),
            permissions: self.permissions.clone(),
            token_version: self.token_version,
        }
    }

    /// Public view of this identity within `session_id`
    pub fn summary(&self, session_id: Option<String>) -> IdentitySummary {
        IdentitySummary {
            subject_id: self.subject_id.clone(),
            subject_type: self.subject_type,
            login: self.login.clone(),
            role: self.role.clone(),
            permissions: self.permissions.clone(),
            session_id,
        }
    }
}

/// Identity data safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub login: String,
    pub role: String,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identity() -> Identity {
        Identity::new("42", SubjectType::Admin, "root", "hash", "superadmin")
            .with_permissions(["reports:read", "users:write"])
    }

    #[test]
    fn test_new_identity_is_active() {
        let identity = identity();
        assert_eq!(identity.status, IdentityStatus::Active);
        assert!(identity.is_active_at(Utc::now()));
        assert_eq!(identity.permissions.len(), 2);
    }

    #[test]
    fn test_expired_lock_counts_as_active() {
        let now = Utc::now();
        let mut identity = identity();
        identity.status = IdentityStatus::Locked;
        identity.locked_until = Some(now + Duration::minutes(5));
        assert!(identity.is_locked_at(now));
        assert!(!identity.is_active_at(now));

        identity.locked_until = Some(now - Duration::seconds(1));
        assert!(!identity.is_locked_at(now));
        assert!(identity.is_active_at(now));
    }

    #[test]
    fn test_blocked_suspended_pending_are_inactive() {
        let now = Utc::now();
        for status in [IdentityStatus::Blocked, IdentityStatus::Suspended, IdentityStatus::Pending] {
            let mut identity = identity();
            identity.status = status;
            assert!(!identity.is_active_at(now), "{:?} should be inactive", status);
        }
    }

    #[test]
    fn test_token_subject_carries_current_role() {
        let mut identity = identity();
        identity.role = "auditor".into();
        identity.token_version = 3;

        let subject = identity.token_subject();
        assert_eq!(subject.subject_type, "admin");
        assert_eq!(subject.role, "auditor");
        assert_eq!(subject.token_version, 3);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(identity()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["subject_type"], "admin");
    }
}
