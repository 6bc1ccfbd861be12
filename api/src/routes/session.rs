//! Protected session introspection

use actix_web::HttpResponse;
use serde_json::json;

use crate::middleware::AuthContext;

/// Handler for GET /api/session
///
/// Answers from the claims the access token middleware verified, without
/// touching the identity store.
pub async fn current_session(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "subject_id": auth.subject_id,
        "subject_type": auth.subject_type,
        "role": auth.role,
        "permissions": auth.permissions,
        "session_id": auth.session_id,
    }))
}
