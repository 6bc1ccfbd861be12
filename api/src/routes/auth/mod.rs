//! Authentication route handlers
//!
//! - Login with password
//! - Token rotation
//! - Current identity
//! - Logout

pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;

use actix_web::HttpRequest;

pub use crate::state::AppState;

/// Client IP for logging, honouring reverse proxy headers
pub(crate) fn extract_client_ip(req: &HttpRequest) -> String {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded) = forwarded_for.to_str() {
            // First hop is the original client
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip) = real_ip.to_str() {
            return ip.to_string();
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}
