//! Application factory
//!
//! Builds the actix-web application around an [`AppState`]. Shared by the
//! server binary and the HTTP integration tests.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error, HttpResponse};
use tracing_actix_web::TracingLogger;

use sg_core::{IdentityRepository, IssuanceRateLimiter, RevocationStore};
use sg_shared::{error_codes, CorsConfig, ErrorResponse};

use crate::middleware::{create_cors, AccessTokenVerifier, JwtAuth};
use crate::routes::auth::{login::login, logout::logout, me::me, refresh::refresh_token};
use crate::routes::session::current_session;
use crate::state::AppState;

/// Create and configure the application with all dependencies
///
/// Routes:
/// - `GET  /health`
/// - `POST /auth/login`
/// - `GET  /auth/me`
/// - `POST /auth/logout`
/// - `POST /api/auth/refresh-token`
/// - `GET  /api/session` (access token required)
pub fn create_app<I, S, L>(
    app_state: web::Data<AppState<I, S, L>>,
    cors_config: &CorsConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    I: IdentityRepository + 'static,
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    let verifier: Arc<dyn AccessTokenVerifier> = app_state.auth_service.tokens().clone();
    let jwt_auth = JwtAuth::new(verifier, app_state.transport.clone());

    App::new()
        .app_data(app_state)
        // Last wrap runs first: CORS answers preflights before anything is logged
        .wrap(TracingLogger::default())
        .wrap(create_cors(cors_config))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(login::<I, S, L>))
                .route("/me", web::get().to(me::<I, S, L>))
                .route("/logout", web::post().to(logout::<I, S, L>)),
        )
        // Registered ahead of the protected scope so rotation works with an
        // expired access token
        .route(
            "/api/auth/refresh-token",
            web::post().to(refresh_token::<I, S, L>),
        )
        .service(
            web::scope("/api")
                .wrap(jwt_auth)
                .route("/session", web::get().to(current_session)),
        )
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "sessionguard-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
