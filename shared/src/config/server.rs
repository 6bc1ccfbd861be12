//! HTTP server and CORS configuration

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker threads (0 = number of CPU cores)
    #[serde(default)]
    pub workers: usize,

    /// Interval between revocation set sweeps, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub revocation_cleanup_interval: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            revocation_cleanup_interval: default_cleanup_interval(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CORS configuration
///
/// Cookie-bound credentials only travel cross-origin when
/// `allow_credentials` is set and the origin is listed explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins; empty mirrors any origin (local development only)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allow credentials (cookies) on cross-origin requests
    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds
    #[serde(default = "default_max_age")]
    pub max_age: usize,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allow_credentials: default_allow_credentials(),
            max_age: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Development configuration allowing the usual local frontend origins
    pub fn development() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            ..Default::default()
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

fn default_port() -> u16 {
    8080
}

fn default_cleanup_interval() -> u64 {
    3600 // 1 hour
}

fn default_allow_credentials() -> bool {
    true
}

fn default_max_age() -> usize {
    3600
}
