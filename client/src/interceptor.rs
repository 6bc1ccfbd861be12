//! Request interception for authenticated HTTP calls

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::manager::TokenManager;

/// What to do with a response once the interceptor has seen it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Hand the response to the caller
    Continue,
    /// Send the request once more
    Replay,
}

/// Hooks run around every request an [`InterceptedClient`] sends
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn before_request(&self, request: &mut Request) -> Result<(), ClientError>;

    async fn after_response(
        &self,
        url: &Url,
        status: StatusCode,
    ) -> Result<InterceptOutcome, ClientError>;
}

/// Attaches the access token to protected requests and refreshes on 401
pub struct AuthInterceptor {
    manager: TokenManager,
    protected_prefixes: Vec<String>,
    public_paths: Vec<String>,
}

impl AuthInterceptor {
    pub fn new(manager: TokenManager) -> Self {
        let config = manager.config();
        Self {
            protected_prefixes: config.protected_prefixes.clone(),
            public_paths: config.public_paths.clone(),
            manager,
        }
    }

    /// Whether requests to `path` carry credentials
    ///
    /// Public paths (login, logout, refresh) are never intercepted, so a
    /// 401 from the refresh endpoint cannot trigger another refresh.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.public_paths.iter().any(|public| public == path) {
            return false;
        }
        self.protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl RequestInterceptor for AuthInterceptor {
    async fn before_request(&self, request: &mut Request) -> Result<(), ClientError> {
        if !self.is_protected(request.url().path()) {
            return Ok(());
        }

        match self.manager.ensure_valid_token().await? {
            Some(token) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Access token is not a valid header value, sending without it"),
            },
            None => debug!(path = request.url().path(), "Relying on session cookies"),
        }
        Ok(())
    }

    async fn after_response(
        &self,
        url: &Url,
        status: StatusCode,
    ) -> Result<InterceptOutcome, ClientError> {
        if status != StatusCode::UNAUTHORIZED || !self.is_protected(url.path()) {
            return Ok(InterceptOutcome::Continue);
        }

        match self.manager.refresh().await {
            Ok(_) => Ok(InterceptOutcome::Replay),
            Err(e) => {
                debug!(error = %e, path = url.path(), "Refresh after 401 failed");
                Ok(InterceptOutcome::Continue)
            }
        }
    }
}

/// `reqwest::Client` wrapper running an interceptor around each request
///
/// A request is replayed at most once, and only when its body can be
/// cloned.
#[derive(Clone)]
pub struct InterceptedClient {
    client: Client,
    interceptor: Arc<dyn RequestInterceptor>,
}

impl InterceptedClient {
    pub fn new(client: Client, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        Self {
            client,
            interceptor,
        }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Build and execute a request
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        self.execute(builder.build()?).await
    }

    pub async fn execute(&self, mut request: Request) -> Result<Response, ClientError> {
        let replay = request.try_clone();
        let url = request.url().clone();

        self.interceptor.before_request(&mut request).await?;
        let response = self.client.execute(request).await?;

        let outcome = self
            .interceptor
            .after_response(&url, response.status())
            .await?;

        match (outcome, replay) {
            (InterceptOutcome::Replay, Some(mut again)) => {
                debug!(url = %url, "Replaying request with refreshed credentials");
                self.interceptor.before_request(&mut again).await?;
                Ok(self.client.execute(again).await?)
            }
            (InterceptOutcome::Replay, None) => {
                warn!(url = %url, "Request body cannot be replayed");
                Ok(response)
            }
            (InterceptOutcome::Continue, _) => Ok(response),
        }
    }
}
