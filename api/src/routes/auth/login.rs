use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::dto::auth::{LoginRequest, LoginResponse, SessionResponse};
use crate::handlers::{handle_domain_error, handle_validation_errors};

use sg_core::{IdentityRepository, IssuanceRateLimiter, RevocationStore};

use super::{extract_client_ip, AppState};

/// Handler for POST /auth/login
///
/// Authenticates with login and password, sets the `accessToken`,
/// `refreshToken` and `sessionId` cookies and returns the identity with the
/// token lifetimes. Tokens are never put in the body.
///
/// # Request Body
///
/// ```json
/// {
///     "login": "ops",
///     "password": "..."
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Missing login or password
/// - 401 Unauthorized: Invalid credentials (`attempts_remaining` in details)
/// - 403 Forbidden: Account blocked, suspended or pending
/// - 423 Locked: Too many failed attempts (`retry_after_seconds` in details)
/// - 429 Too Many Requests: Issuance window full
pub async fn login<I, S, L>(
    req: HttpRequest,
    state: web::Data<AppState<I, S, L>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    I: IdentityRepository + 'static,
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors);
    }

    let client_ip = extract_client_ip(&req);
    match state
        .auth_service
        .login(&request.login, &request.password, Some(&client_ip))
        .await
    {
        Ok(result) => {
            let body = LoginResponse {
                session: SessionResponse::from_pair(&result.tokens, Utc::now()),
                identity: result.identity,
            };

            let mut response = HttpResponse::Ok();
            state.transport.apply(&mut response, &result.tokens);
            response.json(body)
        }
        Err(error) => handle_domain_error(&error),
    }
}
