//! Configuration module with business-specific sub-modules
//!
//! - `auth` - JWT secrets, token lifetimes and cookie attributes
//! - `client` - Client token manager timings (refresh, breaker, retry, cache)
//! - `environment` - Environment detection and logging configuration
//! - `rate_limit` - Token issuance and login attempt limits
//! - `server` - HTTP server and CORS configuration
//! - `storage` - Revocation store backend and seeded identities

pub mod auth;
pub mod client;
pub mod environment;
pub mod rate_limit;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use auth::{AuthConfig, CookieConfig, JwtConfig};
pub use client::{AuthCacheSettings, CircuitBreakerSettings, ClientConfig, RetrySettings};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::{AuthRateLimits, RateLimitConfig, TokenRateLimits};
pub use server::{CorsConfig, ServerConfig};
pub use storage::{SeedIdentity, StorageBackend, StorageConfig};

/// Prefix of environment variables layered by [`AppConfig::load`],
/// e.g. `SG__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SG";

/// Errors raised while assembling the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Client token manager configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::new("127.0.0.1", 8080),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::development(),
            cors: CorsConfig::development(),
            logging: LoggingConfig::for_environment(Environment::Development),
            client: ClientConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            auth: AuthConfig {
                jwt: JwtConfig::default(),
                cookie: CookieConfig::production(),
            },
            rate_limit: RateLimitConfig::production(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
            client: ClientConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Build configuration from process environment variables only
    pub fn from_env() -> Self {
        let env = Environment::from_env();
        let mut config = match env {
            Environment::Production => Self::production(),
            _ => Self::development(),
        };
        config.environment = env;
        config.logging = LoggingConfig::for_environment(env);
        config.auth = AuthConfig::from_env(env.requires_secure_cookies());
        config.rate_limit = config.rate_limit.with_env_overrides();
        config.storage = StorageConfig::from_env();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }
        config
    }

    /// Load the layered configuration.
    ///
    /// Layers, lowest precedence first:
    /// 1. `.env` file (via dotenvy) and plain environment variables ([`AppConfig::from_env`])
    /// 2. the environment's TOML file, or `path` when given (optional)
    /// 3. `SG__`-prefixed environment variables
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base = Self::from_env();
        let file = path.unwrap_or_else(|| base.environment.config_file()).to_string();

        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&base)?)
            .add_source(::config::File::with_name(&file).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        tracing::debug!(environment = %config.environment, file = %file, "Configuration loaded");
        Ok(config)
    }
}
