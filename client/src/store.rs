//! Local storage of the current token pair

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{TimeZone, Utc};
use cookie::Cookie;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use tracing::debug;

use sg_core::services::token::codec;
use sg_core::TokenPair;
use sg_shared::CookieConfig;

/// Where the manager keeps the current pair
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<TokenPair>;
    fn save(&self, pair: &TokenPair);
    fn clear(&self);
}

/// Pair held in process memory
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.pair
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, pair: &TokenPair) {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
    }

    fn clear(&self) {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Pair read from the cookie jar shared with the HTTP client
///
/// Cookies set by login or rotation responses land in the jar; expiries
/// are read from the (unverified) token claims since the jar does not
/// expose cookie attributes.
#[derive(Debug)]
pub struct CookieJarTokenStore {
    jar: Arc<Jar>,
    url: Url,
    names: CookieConfig,
}

impl CookieJarTokenStore {
    pub fn new(jar: Arc<Jar>, url: Url, names: CookieConfig) -> Self {
        Self { jar, url, names }
    }

    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }
}

/// Value of the cookie `name` in a `Cookie` request header, if non-empty
fn cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

impl TokenStore for CookieJarTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let header = self.jar.cookies(&self.url)?;
        let header = header.to_str().ok()?;

        let access_token = cookie_value(header, &self.names.access_cookie_name)?;
        let refresh_token = cookie_value(header, &self.names.refresh_cookie_name)?;

        let (Ok(access), Ok(refresh)) = (codec::decode(&access_token), codec::decode(&refresh_token))
        else {
            debug!("Cookie jar holds tokens that cannot be decoded");
            return None;
        };

        Some(TokenPair {
            session_id: cookie_value(header, &self.names.session_cookie_name)
                .unwrap_or_else(|| access.session_id.clone()),
            issued_at: Utc.timestamp_opt(access.iat, 0).single()?,
            access_expires_at: access.expires_at()?,
            refresh_expires_at: refresh.expires_at()?,
            access_token,
            refresh_token,
        })
    }

    fn save(&self, pair: &TokenPair) {
        for (name, value) in [
            (&self.names.access_cookie_name, &pair.access_token),
            (&self.names.refresh_cookie_name, &pair.refresh_token),
            (&self.names.session_cookie_name, &pair.session_id),
        ] {
            self.jar
                .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.url);
        }
    }

    fn clear(&self) {
        for name in [
            &self.names.access_cookie_name,
            &self.names.refresh_cookie_name,
            &self.names.session_cookie_name,
        ] {
            self.jar
                .add_cookie_str(&format!("{}=; Path=/; Max-Age=0", name), &self.url);
        }
    }
}
