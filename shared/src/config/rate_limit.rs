//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Token issuance limits
    #[serde(default)]
    pub token: TokenRateLimits,

    /// Login attempt limits
    #[serde(default)]
    pub auth: AuthRateLimits,
}

/// Limits on how often a single identity may be issued a token pair
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenRateLimits {
    /// Max token pair issuances per identity within the window
    #[serde(default = "default_max_token_attempts")]
    pub max_attempts: u32,

    /// Sliding window length in seconds
    #[serde(default = "default_attempt_window")]
    pub window_seconds: u64,
}

impl Default for TokenRateLimits {
    fn default() -> Self {
        Self {
            max_attempts: default_max_token_attempts(),
            window_seconds: default_attempt_window(),
        }
    }
}

/// Authentication-specific rate limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthRateLimits {
    /// Number of failed attempts before locking
    #[serde(default = "default_failed_attempts_threshold")]
    pub failed_attempts_threshold: u32,

    /// Account lock duration after failed attempts in seconds
    #[serde(default = "default_account_lock_duration")]
    pub account_lock_duration: u64,
}

impl Default for AuthRateLimits {
    fn default() -> Self {
        Self {
            failed_attempts_threshold: default_failed_attempts_threshold(),
            account_lock_duration: default_account_lock_duration(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            token: TokenRateLimits::default(),
            auth: AuthRateLimits::default(),
        }
    }
}

impl RateLimitConfig {
    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            enabled: true,
            token: TokenRateLimits {
                max_attempts: 50,
                ..Default::default()
            },
            auth: AuthRateLimits {
                failed_attempts_threshold: 10,
                account_lock_duration: 60,
            },
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }

    /// Read overrides from `TOKEN_MAX_ATTEMPTS`, `TOKEN_ATTEMPT_WINDOW`,
    /// `LOGIN_FAILED_ATTEMPTS` and `ACCOUNT_LOCK_DURATION`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = parse_env("TOKEN_MAX_ATTEMPTS") {
            self.token.max_attempts = v;
        }
        if let Some(v) = parse_env("TOKEN_ATTEMPT_WINDOW") {
            self.token.window_seconds = v;
        }
        if let Some(v) = parse_env("LOGIN_FAILED_ATTEMPTS") {
            self.auth.failed_attempts_threshold = v;
        }
        if let Some(v) = parse_env("ACCOUNT_LOCK_DURATION") {
            self.auth.account_lock_duration = v;
        }
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_enabled() -> bool {
    true
}

fn default_max_token_attempts() -> u32 {
    5
}

fn default_attempt_window() -> u64 {
    900 // 15 minutes
}

fn default_failed_attempts_threshold() -> u32 {
    5
}

fn default_account_lock_duration() -> u64 {
    1800 // 30 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.token.max_attempts, 5);
        assert_eq!(config.token.window_seconds, 900);
        assert_eq!(config.auth.failed_attempts_threshold, 5);
        assert_eq!(config.auth.account_lock_duration, 1800);
    }

    #[test]
    fn test_development_is_lenient() {
        let dev = RateLimitConfig::development();
        assert!(dev.token.max_attempts > RateLimitConfig::production().token.max_attempts);
    }
}
