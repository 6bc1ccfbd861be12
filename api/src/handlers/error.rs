//! Mapping of domain errors onto HTTP responses

use actix_web::http::header::RETRY_AFTER;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use tracing::{error, warn};
use validator::ValidationErrors;

use sg_core::{AuthError, DomainError, TokenError};
use sg_shared::{error_codes, ErrorResponse, IntoErrorResponse};

/// HTTP status for a domain error
pub fn error_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::ValidationErr(_) => StatusCode::BAD_REQUEST,
        DomainError::Token(TokenError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        DomainError::Token(TokenError::TokenGenerationFailed) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Token(_) => StatusCode::UNAUTHORIZED,
        DomainError::Auth(AuthError::InvalidCredentials { .. }) => StatusCode::UNAUTHORIZED,
        DomainError::Auth(AuthError::AccountLocked { .. }) => StatusCode::LOCKED,
        DomainError::Auth(_) => StatusCode::FORBIDDEN,
    }
}

/// Convert a domain error into a JSON error response
pub fn handle_domain_error(error: &DomainError) -> HttpResponse {
    error_response_builder(error).json(error.to_error_response())
}

/// Status and headers for a domain error, leaving the body to the caller
///
/// Used where the response needs more than the error itself, such as
/// removal cookies.
pub fn error_response_builder(error: &DomainError) -> HttpResponseBuilder {
    let status = error_status(error);
    if status.is_server_error() {
        error!(error = %error, "Request failed");
    } else {
        warn!(error = %error, status = status.as_u16(), "Request rejected");
    }

    let mut response = HttpResponse::build(status);
    if let DomainError::Token(TokenError::RateLimited { retry_after_seconds }) = error {
        response.insert_header((RETRY_AFTER, retry_after_seconds.to_string()));
    }
    response
}

/// Convert DTO validation failures into a 400 response listing the fields
pub fn handle_validation_errors(errors: &ValidationErrors) -> HttpResponse {
    let fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    HttpResponse::BadRequest().json(
        ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request body")
            .add_detail("fields", fields),
    )
}
