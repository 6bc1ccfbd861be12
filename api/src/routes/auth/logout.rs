use actix_web::{web, HttpRequest, HttpResponse};
use tracing::warn;

use crate::dto::auth::LogoutResponse;

use sg_core::{IdentityRepository, IssuanceRateLimiter, RevocationStore};

use super::AppState;

/// Handler for POST /auth/logout
///
/// Revokes whichever of the refresh and access tokens were presented and
/// clears the cookies. Always answers 200, even when nothing was presented
/// or revocation failed, so a client can always get back to a clean state.
pub async fn logout<I, S, L>(req: HttpRequest, state: web::Data<AppState<I, S, L>>) -> HttpResponse
where
    I: IdentityRepository + 'static,
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    let credentials = state.transport.extract(&req);

    if let Err(error) = state
        .auth_service
        .logout(
            credentials.refresh_token.as_deref(),
            credentials.access_token.as_deref(),
        )
        .await
    {
        warn!(error = %error, "Token revocation failed during logout");
    }

    let mut response = HttpResponse::Ok();
    state.transport.apply_clear(&mut response);
    response.json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    })
}
