//! Deployment environment and logging configuration

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Cookies are only marked `Secure` outside of local development
    pub fn requires_secure_cookies(&self) -> bool {
        !matches!(self, Environment::Development)
    }

    /// Resolve the environment from `SG_ENV` (falling back to `ENVIRONMENT`)
    pub fn from_env() -> Self {
        env::var("SG_ENV")
            .or_else(|_| env::var("ENVIRONMENT"))
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Name of the optional TOML file layered for this environment
    pub fn config_file(&self) -> &'static str {
        match self {
            Environment::Development => "config/development.toml",
            Environment::Staging => "config/staging.toml",
            Environment::Production => "config/production.toml",
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Logging configuration consumed by the server's tracing subscriber
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error);
    /// `RUST_LOG` takes precedence when set
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Include source location in log lines
    #[serde(default)]
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_log_format(),
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config for environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: String::from("debug"),
                format: LogFormat::Pretty,
                source_location: true,
            },
            Environment::Staging | Environment::Production => Self {
                level: String::from("info"),
                format: LogFormat::Json,
                source_location: false,
            },
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

fn default_level() -> String {
    String::from("info")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
