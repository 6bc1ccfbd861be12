//! # SessionGuard Client
//!
//! Keeps an access token valid on the calling side: proactive and
//! single-flight refresh, a deduplicated authentication probe, a circuit
//! breaker around auth calls, and an HTTP wrapper that attaches tokens and
//! replays a request once after a 401.

pub mod api;
pub mod auth_cache;
pub mod circuit_breaker;
pub mod error;
pub mod interceptor;
pub mod manager;
pub mod pending;
pub mod retry;
pub mod store;

pub use api::{AuthApi, HttpAuthApi};
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use error::ClientError;
pub use interceptor::{AuthInterceptor, InterceptOutcome, InterceptedClient, RequestInterceptor};
pub use manager::{SessionState, TokenManager};
pub use retry::RetryPolicy;
pub use store::{CookieJarTokenStore, MemoryTokenStore, TokenStore};

#[cfg(test)]
mod tests;
