//! HTTP surface of SessionGuard
//!
//! Exposes login, rotation, identity and logout endpoints over actix-web,
//! with credentials carried as cookies by [`transport::CookieTransport`].

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod transport;

pub use app::create_app;
pub use state::AppState;
pub use transport::{CookieTransport, Credentials, ExtractionStrategy};
