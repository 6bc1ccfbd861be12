//! Shared configuration and response types for SessionGuard
//!
//! Used by the server crates and the client token manager alike:
//! - Layered configuration (`AppConfig`, `ClientConfig`, ...)
//! - The JSON error envelope returned by the HTTP surface

pub mod config;
pub mod errors;

pub use config::{
    AppConfig, AuthConfig, ClientConfig, ConfigError, CookieConfig, CorsConfig, Environment,
    JwtConfig, LogFormat, LoggingConfig, RateLimitConfig, SeedIdentity, ServerConfig,
    StorageBackend, StorageConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
