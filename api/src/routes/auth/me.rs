use actix_web::{web, HttpRequest, HttpResponse};

use crate::handlers::handle_domain_error;

use sg_core::{IdentityRepository, IssuanceRateLimiter, RevocationStore, TokenError};

use super::AppState;

/// Handler for GET /auth/me
///
/// Returns the identity behind the transported access token, with role and
/// permissions read from the live record. Doubles as the client's
/// server-session probe.
///
/// ## Errors
/// - 401 Unauthorized: No access token, or it is not valid
pub async fn me<I, S, L>(req: HttpRequest, state: web::Data<AppState<I, S, L>>) -> HttpResponse
where
    I: IdentityRepository + 'static,
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    let Some(access) = state.transport.extract(&req).access_token else {
        return handle_domain_error(&TokenError::NoCredential.into());
    };

    match state.auth_service.me(&access).await {
        Ok(identity) => HttpResponse::Ok().json(identity),
        Err(error) => handle_domain_error(&error),
    }
}
