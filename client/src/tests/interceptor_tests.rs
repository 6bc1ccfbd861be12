//! Unit tests for AuthInterceptor

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Request, StatusCode, Url};

use sg_shared::ClientConfig;

use super::mocks::{pair, MockAuthApi};
use crate::interceptor::{AuthInterceptor, InterceptOutcome, RequestInterceptor};
use crate::manager::TokenManager;
use crate::store::MemoryTokenStore;

fn interceptor() -> (AuthInterceptor, Arc<MockAuthApi>) {
    let api = Arc::new(MockAuthApi::new());
    let store = Arc::new(MemoryTokenStore::with_pair(pair(
        "initial",
        chrono::Duration::minutes(15),
    )));
    let manager = TokenManager::new(api.clone(), store, ClientConfig::default());
    (AuthInterceptor::new(manager), api)
}

fn url(path: &str) -> Url {
    Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
}

#[tokio::test]
async fn test_protected_paths() {
    let (interceptor, _) = interceptor();

    assert!(interceptor.is_protected("/api/session"));
    assert!(interceptor.is_protected("/auth/me"));
    assert!(!interceptor.is_protected("/auth/login"));
    assert!(!interceptor.is_protected("/auth/logout"));
    assert!(!interceptor.is_protected("/api/auth/refresh-token"));
    assert!(!interceptor.is_protected("/health"));
}

#[tokio::test]
async fn test_bearer_added_to_protected_requests_only() {
    let (interceptor, _) = interceptor();

    let mut protected = Request::new(Method::GET, url("/api/session"));
    interceptor.before_request(&mut protected).await.unwrap();
    assert_eq!(
        protected.headers().get(AUTHORIZATION).unwrap(),
        "Bearer access-initial"
    );

    let mut public = Request::new(Method::POST, url("/auth/login"));
    interceptor.before_request(&mut public).await.unwrap();
    assert!(public.headers().get(AUTHORIZATION).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_protected_response_is_replayed() {
    let (interceptor, api) = interceptor();

    let outcome = interceptor
        .after_response(&url("/api/session"), StatusCode::UNAUTHORIZED)
        .await
        .unwrap();

    assert_eq!(outcome, InterceptOutcome::Replay);
    assert_eq!(api.rotate_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_refresh_endpoint_is_not_retried() {
    let (interceptor, api) = interceptor();

    let outcome = interceptor
        .after_response(&url("/api/auth/refresh-token"), StatusCode::UNAUTHORIZED)
        .await
        .unwrap();

    assert_eq!(outcome, InterceptOutcome::Continue);
    assert_eq!(api.rotate_calls(), 0);
}

#[tokio::test]
async fn test_other_statuses_pass_through() {
    let (interceptor, api) = interceptor();

    for status in [StatusCode::OK, StatusCode::FORBIDDEN, StatusCode::INTERNAL_SERVER_ERROR] {
        let outcome = interceptor
            .after_response(&url("/api/session"), status)
            .await
            .unwrap();
        assert_eq!(outcome, InterceptOutcome::Continue);
    }
    assert_eq!(api.rotate_calls(), 0);
}
