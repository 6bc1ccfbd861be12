//! Access token middleware on the protected `/api` scope

mod common;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::dev::ServiceResponse;
use actix_web::{test, web, App, HttpResponse};
use serde_json::{json, Value};

use sg_api::create_app;
use sg_api::middleware::{AuthContext, OptionalAuth};
use sg_shared::CorsConfig;

use common::{state, LOGIN, PASSWORD};

fn cookie_named<B>(resp: &ServiceResponse<B>, name: &str) -> String {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .unwrap()
}

fn login_request() -> test::TestRequest {
    test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "login": LOGIN, "password": PASSWORD }))
}

#[actix_web::test]
async fn test_protected_route_requires_token() {
    let app = test::init_service(create_app(state(), &CorsConfig::default())).await;

    let req = test::TestRequest::get().uri("/api/session").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "no_credential");
}

#[actix_web::test]
async fn test_protected_route_rejects_garbage() {
    let app = test::init_service(create_app(state(), &CorsConfig::default())).await;

    let req = test::TestRequest::get()
        .uri("/api/session")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "malformed_token");
}

#[actix_web::test]
async fn test_protected_route_with_bearer_and_cookie() {
    let app = test::init_service(create_app(state(), &CorsConfig::default())).await;
    let login = test::call_service(&app, login_request().to_request()).await;
    let access = cookie_named(&login, "accessToken");

    let req = test::TestRequest::get()
        .uri("/api/session")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", access)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["subject_id"], "ops-1");
    assert_eq!(body["permissions"], json!(["sessions:revoke"]));

    let req = test::TestRequest::get()
        .uri("/api/session")
        .cookie(Cookie::new("accessToken", access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = test::init_service(create_app(state(), &CorsConfig::default())).await;

    let login = test::call_service(&app, login_request().to_request()).await;
    let refresh = cookie_named(&login, "refreshToken");

    let req = test::TestRequest::get()
        .uri("/api/session")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", refresh)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "wrong_token_type");
}

#[actix_web::test]
async fn test_extractors_without_middleware() {
    async fn required(auth: AuthContext) -> HttpResponse {
        HttpResponse::Ok().body(auth.subject_id)
    }

    async fn optional(auth: OptionalAuth) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "authenticated": auth.0.is_some() }))
    }

    let app = test::init_service(
        App::new()
            .route("/required", web::get().to(required))
            .route("/optional", web::get().to(optional)),
    )
    .await;

    let req = test::TestRequest::get().uri("/required").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/optional").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["authenticated"], false);
}
