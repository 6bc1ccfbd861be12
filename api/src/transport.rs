//! Cookie-bound credential transport.
//!
//! Moves token pairs between server and browser as three cookies:
//! `accessToken`, `refreshToken` and `sessionId` (names configurable).
//!
//! Extraction runs several strategies in order and takes, per artifact, the
//! first value any strategy finds:
//!
//! 1. actix's structured cookie parser
//! 2. manual parsing of every raw `Cookie` header
//! 3. `Authorization: Bearer` (access token only)
//!
//! The raw header pass exists because the structured parser gives up on the
//! whole header when a single pair is malformed, and because some proxies
//! split cookies over several `Cookie` headers.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::{AUTHORIZATION, COOKIE};
use actix_web::{HttpRequest, HttpResponseBuilder};
use chrono::{DateTime, Utc};

use sg_core::TokenPair;
use sg_shared::CookieConfig;

/// Credentials found on an incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub session_id: Option<String>,
}

impl Credentials {
    /// Whether nothing at all was found
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.session_id.is_none()
    }

    fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.session_id.is_some()
    }

    /// Fill every missing artifact from `other`
    fn fill_from(&mut self, other: Credentials) {
        self.access_token = self.access_token.take().or(other.access_token);
        self.refresh_token = self.refresh_token.take().or(other.refresh_token);
        self.session_id = self.session_id.take().or(other.session_id);
    }
}

/// One way of reading credentials off a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// actix's parsed cookie jar
    CookieParser,
    /// Manual split of the raw `Cookie` headers
    RawCookieHeader,
    /// `Authorization: Bearer <token>`
    BearerHeader,
}

impl ExtractionStrategy {
    /// Order in which strategies are consulted
    pub const ORDER: [ExtractionStrategy; 3] = [
        ExtractionStrategy::CookieParser,
        ExtractionStrategy::RawCookieHeader,
        ExtractionStrategy::BearerHeader,
    ];
}

/// Attaches, extracts and clears cookie credentials
#[derive(Debug, Clone)]
pub struct CookieTransport {
    config: CookieConfig,
}

impl CookieTransport {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Cookies carrying `pair`
    ///
    /// Each cookie lives exactly as long as its token; the session id
    /// follows the refresh token.
    pub fn attach(&self, pair: &TokenPair, now: DateTime<Utc>) -> Vec<Cookie<'static>> {
        vec![
            self.build(
                &self.config.access_cookie_name,
                pair.access_token.clone(),
                pair.access_expires_in(now),
            ),
            self.build(
                &self.config.refresh_cookie_name,
                pair.refresh_token.clone(),
                pair.refresh_expires_in(now),
            ),
            self.build(
                &self.config.session_cookie_name,
                pair.session_id.clone(),
                pair.refresh_expires_in(now),
            ),
        ]
    }

    /// Removal cookies for all three artifacts
    ///
    /// Path and domain match `attach`, otherwise browsers keep the originals.
    pub fn clear(&self) -> Vec<Cookie<'static>> {
        [
            &self.config.access_cookie_name,
            &self.config.refresh_cookie_name,
            &self.config.session_cookie_name,
        ]
        .into_iter()
        .map(|name| {
            let mut cookie = self.build(name, String::new(), 0);
            cookie.make_removal();
            cookie
        })
        .collect()
    }

    /// Add the cookies for `pair` to a response
    pub fn apply(&self, response: &mut HttpResponseBuilder, pair: &TokenPair) {
        for cookie in self.attach(pair, Utc::now()) {
            response.cookie(cookie);
        }
    }

    /// Add removal cookies to a response
    pub fn apply_clear(&self, response: &mut HttpResponseBuilder) {
        for cookie in self.clear() {
            response.cookie(cookie);
        }
    }

    /// Read credentials off `req`, falling through the strategies
    pub fn extract(&self, req: &HttpRequest) -> Credentials {
        let mut found = Credentials::default();
        for strategy in ExtractionStrategy::ORDER {
            if found.is_complete() {
                break;
            }
            found.fill_from(self.extract_with(strategy, req));
        }
        found
    }

    /// Run a single strategy
    pub fn extract_with(&self, strategy: ExtractionStrategy, req: &HttpRequest) -> Credentials {
        match strategy {
            ExtractionStrategy::CookieParser => Credentials {
                access_token: parsed_cookie(req, &self.config.access_cookie_name),
                refresh_token: parsed_cookie(req, &self.config.refresh_cookie_name),
                session_id: parsed_cookie(req, &self.config.session_cookie_name),
            },
            ExtractionStrategy::RawCookieHeader => {
                let pairs = raw_cookie_pairs(req);
                let lookup = |name: &str| {
                    pairs
                        .iter()
                        .find(|(key, value)| key == name && !value.is_empty())
                        .map(|(_, value)| value.clone())
                };
                Credentials {
                    access_token: lookup(self.config.access_cookie_name.as_str()),
                    refresh_token: lookup(self.config.refresh_cookie_name.as_str()),
                    session_id: lookup(self.config.session_cookie_name.as_str()),
                }
            }
            ExtractionStrategy::BearerHeader => Credentials {
                access_token: bearer_token(req),
                ..Default::default()
            },
        }
    }

    fn build(&self, name: &str, value: String, max_age_seconds: i64) -> Cookie<'static> {
        let mut builder = Cookie::build(name.to_owned(), value)
            .path(self.config.path.clone())
            .http_only(self.config.http_only)
            .secure(self.config.secure)
            .same_site(same_site(&self.config.same_site))
            .max_age(CookieDuration::seconds(max_age_seconds.max(0)));

        if let Some(domain) = &self.config.domain {
            builder = builder.domain(domain.clone());
        }
        builder.finish()
    }
}

fn same_site(value: &str) -> SameSite {
    match value.to_ascii_lowercase().as_str() {
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        _ => SameSite::Strict,
    }
}

fn parsed_cookie(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|cookie| cookie.value().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn raw_cookie_pairs(req: &HttpRequest) -> Vec<(String, String)> {
    req.headers()
        .get_all(COOKIE)
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = value.trim().trim_matches('"');
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Duration;

    fn transport() -> CookieTransport {
        CookieTransport::new(CookieConfig::default())
    }

    fn pair(now: DateTime<Utc>) -> TokenPair {
        TokenPair {
            access_token: "access.jwt".into(),
            refresh_token: "refresh.jwt".into(),
            session_id: "sess-1".into(),
            issued_at: now,
            access_expires_at: now + Duration::hours(1),
            refresh_expires_at: now + Duration::days(30),
        }
    }

    #[test]
    fn test_attach_sets_lifetimes_and_attributes() {
        let now = Utc::now();
        let cookies = transport().attach(&pair(now), now);

        assert_eq!(cookies.len(), 3);
        let access = &cookies[0];
        assert_eq!(access.name(), "accessToken");
        assert_eq!(access.value(), "access.jwt");
        assert_eq!(access.max_age(), Some(CookieDuration::seconds(3600)));
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Strict));
        assert_eq!(access.path(), Some("/"));

        assert_eq!(cookies[1].max_age(), Some(CookieDuration::days(30)));
        assert_eq!(cookies[2].name(), "sessionId");
        assert_eq!(cookies[2].max_age(), cookies[1].max_age());
    }

    #[test]
    fn test_production_cookies_are_secure_with_domain() {
        let transport = CookieTransport::new(CookieConfig::production().with_domain("example.com"));
        let now = Utc::now();

        for cookie in transport.attach(&pair(now), now) {
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.domain(), Some("example.com"));
        }
    }

    #[test]
    fn test_clear_matches_attach_scope() {
        let transport = CookieTransport::new(CookieConfig::default().with_domain("example.com"));
        let cleared = transport.clear();

        assert_eq!(cleared.len(), 3);
        for cookie in cleared {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.domain(), Some("example.com"));
        }
    }

    #[test]
    fn test_extract_from_parsed_cookies() {
        let req = TestRequest::default()
            .cookie(Cookie::new("accessToken", "a"))
            .cookie(Cookie::new("refreshToken", "r"))
            .cookie(Cookie::new("sessionId", "s"))
            .to_http_request();

        let found = transport().extract(&req);
        assert_eq!(found.access_token.as_deref(), Some("a"));
        assert_eq!(found.refresh_token.as_deref(), Some("r"));
        assert_eq!(found.session_id.as_deref(), Some("s"));
    }

    #[test]
    fn test_raw_header_strategy_covers_split_headers() {
        let req = TestRequest::default()
            .append_header((COOKIE, "theme=dark; refreshToken=r2"))
            .append_header((COOKIE, "sessionId=\"s2\""))
            .to_http_request();

        let raw = transport().extract_with(ExtractionStrategy::RawCookieHeader, &req);
        assert_eq!(raw.refresh_token.as_deref(), Some("r2"));
        assert_eq!(raw.session_id.as_deref(), Some("s2"));

        let found = transport().extract(&req);
        assert_eq!(found.refresh_token.as_deref(), Some("r2"));
        assert_eq!(found.session_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_bearer_fills_missing_access_token() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer header.jwt"))
            .cookie(Cookie::new("refreshToken", "r"))
            .to_http_request();

        let found = transport().extract(&req);
        assert_eq!(found.access_token.as_deref(), Some("header.jwt"));
        assert_eq!(found.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer header.jwt"))
            .cookie(Cookie::new("accessToken", "cookie.jwt"))
            .to_http_request();

        assert_eq!(
            transport().extract(&req).access_token.as_deref(),
            Some("cookie.jwt")
        );
    }

    #[test]
    fn test_nothing_presented() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcg=="))
            .to_http_request();

        assert!(transport().extract(&req).is_empty());
    }

    #[test]
    fn test_expired_pair_gets_zero_max_age() {
        let now = Utc::now();
        let cookies = transport().attach(&pair(now - Duration::days(31)), now);
        assert!(cookies
            .iter()
            .all(|cookie| cookie.max_age() == Some(CookieDuration::ZERO)));
    }
}
