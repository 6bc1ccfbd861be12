//! Network side of the token manager

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::COOKIE;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use sg_core::TokenPair;
use sg_shared::{ClientConfig, ErrorResponse};

use crate::error::ClientError;

/// Calls the token manager makes against the auth server
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a refresh token for a new pair
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, ClientError>;

    /// Whether the credentials the transport carries still authenticate
    async fn probe(&self) -> Result<bool, ClientError>;
}

#[derive(Debug, Deserialize)]
struct RotationBody {
    access_token: String,
    refresh_token: String,
    session_id: String,
    access_expires_at: DateTime<Utc>,
    refresh_expires_at: DateTime<Utc>,
}

/// [`AuthApi`] over HTTP
///
/// Share the `reqwest::Client` (and its cookie jar) with the rest of the
/// application so the probe sees the same session cookies.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    refresh_url: String,
    probe_url: String,
    refresh_cookie_name: String,
}

impl HttpAuthApi {
    pub fn new(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            refresh_url: config.url(&config.refresh_path),
            probe_url: config.url(&config.probe_path),
            refresh_cookie_name: String::from("refreshToken"),
        }
    }

    pub fn with_refresh_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.refresh_cookie_name = name.into();
        self
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        let response = self
            .client
            .post(&self.refresh_url)
            .header(COOKIE, format!("{}={}", self.refresh_cookie_name, refresh_token))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(rejection(response).await);
        }

        let body: RotationBody = response.json().await?;
        debug!(session_id = %body.session_id, "Token pair rotated");
        Ok(TokenPair {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            session_id: body.session_id,
            issued_at: Utc::now(),
            access_expires_at: body.access_expires_at,
            refresh_expires_at: body.refresh_expires_at,
        })
    }

    async fn probe(&self) -> Result<bool, ClientError> {
        let response = self.client.get(&self.probe_url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            _ => Err(rejection(response).await),
        }
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status();
    let body = response.json::<ErrorResponse>().await.ok();
    ClientError::from_response(status, body)
}
