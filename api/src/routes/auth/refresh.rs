use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::dto::auth::TokenResponse;
use crate::handlers::{error_response_builder, handle_domain_error};

use sg_core::{DomainError, IdentityRepository, IssuanceRateLimiter, RevocationStore, TokenError};
use sg_shared::IntoErrorResponse;

use super::AppState;

/// Handler for POST /api/auth/refresh-token
///
/// Rotates the refresh token found by the cookie transport. No request body.
/// On success the cookies are replaced and the new pair is also returned in
/// the body for clients that keep tokens themselves.
///
/// ## Errors
/// - 401 Unauthorized: No refresh token, or it is malformed, expired, already
///   used, of the wrong type, or its identity is no longer active. Cookies
///   are cleared so the browser stops presenting the dead token.
/// - 429 Too Many Requests: Issuance window full
pub async fn refresh_token<I, S, L>(
    req: HttpRequest,
    state: web::Data<AppState<I, S, L>>,
) -> HttpResponse
where
    I: IdentityRepository + 'static,
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    let Some(refresh) = state.transport.extract(&req).refresh_token else {
        return handle_domain_error(&TokenError::NoCredential.into());
    };

    match state.auth_service.refresh(&refresh).await {
        Ok(pair) => {
            let mut response = HttpResponse::Ok();
            state.transport.apply(&mut response, &pair);
            response.json(TokenResponse::from_pair(&pair, Utc::now()))
        }
        Err(
            error @ DomainError::Token(
                TokenError::RateLimited { .. } | TokenError::TokenGenerationFailed,
            ),
        ) => handle_domain_error(&error),
        Err(error @ DomainError::Token(_)) => {
            let mut response = error_response_builder(&error);
            state.transport.apply_clear(&mut response);
            response.json(error.to_error_response())
        }
        Err(error) => handle_domain_error(&error),
    }
}
