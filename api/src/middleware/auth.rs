//! Access token middleware for protecting API endpoints.
//!
//! Reads the access token through the cookie transport (cookie first,
//! then `Authorization: Bearer`), verifies it with the token service and
//! injects an [`AuthContext`] into the request extensions.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use tracing::debug;

use sg_core::{
    DomainError, DomainResult, IssuanceRateLimiter, RevocationStore, SubjectType, TokenError,
    TokenPayload, TokenService, Verification,
};

use crate::handlers::handle_domain_error;
use crate::transport::CookieTransport;

/// Authentication context injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub role: String,
    pub permissions: Vec<String>,
    pub session_id: String,
    /// Token id, for correlating logs
    pub token_id: String,
}

impl AuthContext {
    pub fn from_payload(payload: TokenPayload) -> Self {
        Self {
            subject_id: payload.sub,
            subject_type: payload.subject_type,
            role: payload.role,
            permissions: payload.permissions,
            session_id: payload.session_id,
            token_id: payload.jti,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission || p == "*")
    }
}

/// Object-safe view of the token service used by the middleware
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    async fn verify_access(&self, token: &str) -> DomainResult<Verification>;
}

#[async_trait]
impl<S, L> AccessTokenVerifier for TokenService<S, L>
where
    S: RevocationStore,
    L: IssuanceRateLimiter,
{
    async fn verify_access(&self, token: &str) -> DomainResult<Verification> {
        TokenService::verify_access(self, token).await
    }
}

/// Access token middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    verifier: Arc<dyn AccessTokenVerifier>,
    transport: CookieTransport,
}

impl JwtAuth {
    pub fn new(verifier: Arc<dyn AccessTokenVerifier>, transport: CookieTransport) -> Self {
        Self {
            verifier,
            transport,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            transport: self.transport.clone(),
        }))
    }
}

/// Access token middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<dyn AccessTokenVerifier>,
    transport: CookieTransport,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let token = self.transport.extract(req.request()).access_token;

        Box::pin(async move {
            let outcome: DomainResult<TokenPayload> = match token {
                None => Err(TokenError::NoCredential.into()),
                Some(token) => match verifier.verify_access(&token).await {
                    Ok(Verification::Valid(payload)) => Ok(payload),
                    Ok(Verification::Invalid(reason)) => {
                        debug!(?reason, path = %req.path(), "Access token rejected");
                        Err(TokenError::from(reason).into())
                    }
                    Err(e) => Err(e),
                },
            };

            match outcome {
                Ok(payload) => {
                    req.extensions_mut().insert(AuthContext::from_payload(payload));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(error) => {
                    let response = handle_domain_error(&error);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

fn reject(error: DomainError) -> Error {
    let response = handle_domain_error(&error);
    InternalError::from_response(error, response).into()
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| reject(TokenError::NoCredential.into()));

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let auth = req.extensions().get::<AuthContext>().cloned();
        ready(Ok(OptionalAuth(auth)))
    }
}
