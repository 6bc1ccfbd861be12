//! Client-side token manager configuration
//!
//! All durations are stored as plain integers so the struct round-trips
//! through TOML and environment variables; use the `Duration` accessors.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the client token manager
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the authentication server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the token rotation endpoint
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Path of the "who am I" probe endpoint
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Refresh once the access token has less than this many seconds left
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_secs: u64,

    /// Interval of the background refresh check, in seconds
    #[serde(default = "default_refresh_check_interval")]
    pub refresh_check_interval_secs: u64,

    /// Timeout of a single authentication probe, in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Authentication check cache
    #[serde(default)]
    pub auth_cache: AuthCacheSettings,

    /// Circuit breaker guarding network auth operations
    #[serde(default)]
    pub breaker: CircuitBreakerSettings,

    /// Refresh retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Polling interval while waiting for cookies after a positive probe, in milliseconds
    #[serde(default = "default_cookie_poll_interval")]
    pub cookie_poll_interval_ms: u64,

    /// Maximum time to wait for cookies after a positive probe, in milliseconds
    #[serde(default = "default_cookie_poll_timeout")]
    pub cookie_poll_timeout_ms: u64,

    /// Path prefixes that require a bearer credential
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,

    /// Paths that are never intercepted (the auth endpoints themselves)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

/// Asymmetric TTLs of the cached authentication check
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthCacheSettings {
    /// TTL of a positive result, in milliseconds
    #[serde(default = "default_success_ttl")]
    pub success_ttl_ms: u64,

    /// TTL of a negative result, in milliseconds
    #[serde(default = "default_failure_ttl")]
    pub failure_ttl_ms: u64,
}

impl Default for AuthCacheSettings {
    fn default() -> Self {
        Self {
            success_ttl_ms: default_success_ttl(),
            failure_ttl_ms: default_failure_ttl(),
        }
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Seconds the circuit stays open before a half-open trial
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            reset_timeout_secs: default_reset_timeout(),
        }
    }
}

/// Exponential backoff followed by one deferred attempt
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Number of backoff retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the final deferred attempt, in seconds
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            max_retries: default_max_retries(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_path: default_refresh_path(),
            probe_path: default_probe_path(),
            refresh_threshold_secs: default_refresh_threshold(),
            refresh_check_interval_secs: default_refresh_check_interval(),
            probe_timeout_ms: default_probe_timeout(),
            auth_cache: AuthCacheSettings::default(),
            breaker: CircuitBreakerSettings::default(),
            retry: RetrySettings::default(),
            cookie_poll_interval_ms: default_cookie_poll_interval(),
            cookie_poll_timeout_ms: default_cookie_poll_timeout(),
            protected_prefixes: default_protected_prefixes(),
            public_paths: default_public_paths(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn cookie_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cookie_poll_interval_ms)
    }

    pub fn cookie_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.cookie_poll_timeout_ms)
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl AuthCacheSettings {
    pub fn success_ttl(&self) -> Duration {
        Duration::from_millis(self.success_ttl_ms)
    }

    pub fn failure_ttl(&self) -> Duration {
        Duration::from_millis(self.failure_ttl_ms)
    }
}

impl CircuitBreakerSettings {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

fn default_base_url() -> String {
    String::from("http://localhost:8080")
}

fn default_refresh_path() -> String {
    String::from("/api/auth/refresh-token")
}

fn default_probe_path() -> String {
    String::from("/auth/me")
}

fn default_refresh_threshold() -> u64 {
    300 // 5 minutes
}

fn default_refresh_check_interval() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    5000
}

fn default_success_ttl() -> u64 {
    10_000
}

fn default_failure_ttl() -> u64 {
    2_000
}

fn default_max_failures() -> u32 {
    5
}

fn default_reset_timeout() -> u64 {
    30
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_cooldown() -> u64 {
    300 // 5 minutes
}

fn default_cookie_poll_interval() -> u64 {
    100
}

fn default_cookie_poll_timeout() -> u64 {
    3000
}

fn default_protected_prefixes() -> Vec<String> {
    vec![String::from("/api/"), String::from("/auth/me")]
}

fn default_public_paths() -> Vec<String> {
    vec![
        String::from("/auth/login"),
        String::from("/auth/logout"),
        String::from("/api/auth/refresh-token"),
    ]
}
