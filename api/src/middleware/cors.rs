//! CORS middleware configuration.
//!
//! Credentials travel as cookies, so cross-origin callers must be listed
//! explicitly: browsers refuse credentialed responses that echo a wildcard
//! origin.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use tracing::info;

use sg_shared::CorsConfig;

/// Creates the CORS middleware from configuration.
///
/// With an empty origin list every origin is mirrored back, which is only
/// meant for local development.
pub fn create_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![
            header::RETRY_AFTER,
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(config.max_age);

    if config.allowed_origins.is_empty() {
        info!("No CORS origins configured, mirroring any origin");
        cors = cors.allow_any_origin();
    } else {
        for origin in config.allowed_origins.iter().map(|o| o.trim()) {
            if !origin.is_empty() {
                info!(origin, "Adding allowed origin");
                cors = cors.allowed_origin(origin);
            }
        }
    }

    if config.allow_credentials {
        cors = cors.supports_credentials();
    }

    cors
}
