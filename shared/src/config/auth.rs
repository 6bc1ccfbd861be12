//! Authentication, token and cookie configuration

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Length of secrets generated when none is configured
const GENERATED_SECRET_LEN: usize = 64;

/// JWT signing configuration
///
/// Access and refresh tokens are signed with distinct secrets so that a
/// leaked access secret cannot be used to forge refresh tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret used to sign access tokens
    #[serde(default = "generate_secret")]
    pub access_secret: String,

    /// Secret used to sign refresh tokens
    #[serde(default = "generate_secret")]
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// JWT audience claim
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Maximum age of a session, measured from the original login, after
    /// which rotation demands re-authentication. `None` disables the check.
    #[serde(default)]
    pub max_session_age: Option<i64>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: generate_secret(),
            refresh_secret: generate_secret(),
            access_token_expiry: default_access_expiry(),
            refresh_token_expiry: default_refresh_expiry(),
            issuer: default_issuer(),
            audience: default_audience(),
            algorithm: default_algorithm(),
            max_session_age: None,
        }
    }
}

impl JwtConfig {
    /// Create a configuration with explicit access and refresh secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Limit how long a session may be kept alive by rotation alone
    pub fn with_max_session_age(mut self, seconds: i64) -> Self {
        self.max_session_age = Some(seconds);
        self
    }

    /// Read the JWT settings from the environment.
    ///
    /// Missing secrets are replaced by random values. Tokens signed with a
    /// generated secret do not survive a restart, so a warning is logged.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            access_secret: secret_from_env("JWT_ACCESS_SECRET"),
            refresh_secret: secret_from_env("JWT_REFRESH_SECRET"),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", defaults.refresh_token_expiry),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(defaults.algorithm),
            max_session_age: std::env::var("JWT_MAX_SESSION_AGE")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

/// Cookie attributes used when binding tokens to HTTP responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Name of the access token cookie
    #[serde(default = "default_access_cookie")]
    pub access_cookie_name: String,

    /// Name of the refresh token cookie
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie_name: String,

    /// Name of the session identifier cookie
    #[serde(default = "default_session_cookie")]
    pub session_cookie_name: String,

    /// Cookie secure flag (HTTPS only)
    #[serde(default)]
    pub secure: bool,

    /// Cookie SameSite attribute (Strict, Lax or None)
    #[serde(default = "default_same_site")]
    pub same_site: String,

    /// Cookie HttpOnly flag
    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// Cookie path attribute
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Optional cookie domain attribute
    #[serde(default)]
    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_cookie_name: default_access_cookie(),
            refresh_cookie_name: default_refresh_cookie(),
            session_cookie_name: default_session_cookie(),
            secure: false,
            same_site: default_same_site(),
            http_only: default_http_only(),
            path: default_cookie_path(),
            domain: None,
        }
    }
}

impl CookieConfig {
    /// Cookie settings for production deployments (secure flag on)
    pub fn production() -> Self {
        Self {
            secure: true,
            ..Default::default()
        }
    }

    /// Set the cookie domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Cookie configuration
    #[serde(default)]
    pub cookie: CookieConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env(secure_cookies: bool) -> Self {
        let mut cookie = if secure_cookies {
            CookieConfig::production()
        } else {
            CookieConfig::default()
        };
        if let Ok(domain) = std::env::var("COOKIE_DOMAIN") {
            cookie.domain = Some(domain);
        }

        Self {
            jwt: JwtConfig::from_env(),
            cookie,
        }
    }
}

/// Generate a random alphanumeric secret
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

fn secret_from_env(key: &str) -> String {
    match std::env::var(key) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!(
                variable = key,
                "Secret not configured, using a generated value; tokens will not survive a restart"
            );
            generate_secret()
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_access_expiry() -> i64 {
    3600 // 1 hour
}

fn default_refresh_expiry() -> i64 {
    30 * 86400 // 30 days
}

fn default_issuer() -> String {
    String::from("sessionguard")
}

fn default_audience() -> String {
    String::from("sessionguard-api")
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_access_cookie() -> String {
    String::from("accessToken")
}

fn default_refresh_cookie() -> String {
    String::from("refreshToken")
}

fn default_session_cookie() -> String {
    String::from("sessionId")
}

fn default_same_site() -> String {
    String::from("Strict")
}

fn default_http_only() -> bool {
    true
}

fn default_cookie_path() -> String {
    String::from("/")
}
