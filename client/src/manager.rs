//! Client-side token lifecycle
//!
//! The [`TokenManager`] keeps the local token pair fresh. Refreshes are
//! single-flight: concurrent callers share one rotation and its outcome.
//! Network calls go through a circuit breaker. Failed refreshes back off
//! exponentially, then the manager falls back on the server session for a
//! cooldown before one deferred attempt decides whether the session is gone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sg_core::TokenPair;
use sg_shared::ClientConfig;

use crate::api::AuthApi;
use crate::auth_cache::AuthCheckCache;
use crate::circuit_breaker::{BreakerSnapshot, CircuitBreaker};
use crate::error::ClientError;
use crate::pending::PendingRegistry;
use crate::retry::RetryPolicy;
use crate::store::TokenStore;

const REFRESH_KEY: &str = "refresh";
const AUTH_CHECK_KEY: &str = "auth_check";

/// Session state as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing checked yet
    Unknown,
    Authenticated,
    /// A rotation is in flight
    Refreshing,
    /// Refresh failed; requests ride on the server session until the
    /// deferred attempt runs
    Fallback,
    /// The session is gone and the user must sign in again
    Expired,
}

#[derive(Default)]
struct CooldownState {
    until: Option<Instant>,
    deferred: Option<JoinHandle<()>>,
}

struct ManagerInner {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    config: ClientConfig,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    auth_cache: AuthCheckCache,
    refreshes: PendingRegistry<Result<TokenPair, ClientError>>,
    probes: PendingRegistry<bool>,
    cooldown: Mutex<CooldownState>,
    state: watch::Sender<SessionState>,
    shutdown: CancellationToken,
}

/// Keeps a valid access token at hand
///
/// Cloning is cheap; clones share breaker, cache and in-flight refreshes.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<ManagerInner>,
}

impl TokenManager {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>, config: ClientConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            inner: Arc::new(ManagerInner {
                api,
                store,
                retry: RetryPolicy::from(&config.retry),
                breaker: CircuitBreaker::from(&config.breaker),
                auth_cache: AuthCheckCache::from(&config.auth_cache),
                refreshes: PendingRegistry::new(),
                probes: PendingRegistry::new(),
                cooldown: Mutex::new(CooldownState::default()),
                state,
                shutdown: CancellationToken::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session_state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Receive every session state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.inner.breaker.snapshot()
    }

    pub fn current_pair(&self) -> Option<TokenPair> {
        self.inner.store.load()
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshes.is_pending(REFRESH_KEY)
    }

    /// Time left before the deferred attempt, while cooling down
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.inner.cooldown_remaining()
    }

    /// Whether `pair` is close enough to expiry to be rotated
    pub fn needs_refresh(&self, pair: &TokenPair) -> bool {
        self.inner.needs_refresh(pair)
    }

    /// Access token to attach to the next request
    ///
    /// `Ok(None)` means no bearer token is available but the server session
    /// still authenticates, so the request should rely on its cookies.
    pub async fn ensure_valid_token(&self) -> Result<Option<String>, ClientError> {
        let pair = match self.inner.store.load() {
            Some(pair) => pair,
            None => {
                if !self.smart_authentication_check().await {
                    return Err(ClientError::NoCredential);
                }
                match self.wait_for_cookies().await {
                    Some(pair) => pair,
                    None => {
                        debug!("Server session valid but no tokens readable locally");
                        return Ok(None);
                    }
                }
            }
        };

        if !self.needs_refresh(&pair) {
            return Ok(Some(pair.access_token));
        }

        match self.refresh().await {
            Ok(fresh) => Ok(Some(fresh.access_token)),
            Err(error) => {
                if pair.access_expires_at > Utc::now() {
                    debug!(error = %error, "Refresh failed, keeping the current token");
                    Ok(Some(pair.access_token))
                } else if self.session_state() == SessionState::Expired {
                    Err(error)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Rotate the stored pair, joining any rotation already in flight
    pub async fn refresh(&self) -> Result<TokenPair, ClientError> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .refreshes
            .run(REFRESH_KEY, move || inner.run_refresh())
            .await
    }

    /// Whether the server still considers this client authenticated
    ///
    /// Answers from cache when fresh, joins a probe already in flight, and
    /// reports `false` without a network call while the breaker is open.
    pub async fn smart_authentication_check(&self) -> bool {
        self.inner.check_authentication().await
    }

    /// Drop the cached authentication answer
    pub fn invalidate_auth_cache(&self) {
        self.inner.auth_cache.invalidate();
    }

    /// Poll the store until tokens appear or the poll timeout elapses
    ///
    /// Cookies set by a response may land in the jar a moment after the
    /// response is observed.
    pub async fn wait_for_cookies(&self) -> Option<TokenPair> {
        let store = &self.inner.store;
        let period = self
            .inner
            .config
            .cookie_poll_interval()
            .max(Duration::from_millis(1));

        let poll = async {
            let mut ticker = time::interval(period);
            loop {
                ticker.tick().await;
                if let Some(pair) = store.load() {
                    return pair;
                }
            }
        };

        time::timeout(self.inner.config.cookie_poll_timeout(), poll)
            .await
            .ok()
    }

    /// Forget the local session, e.g. after logout
    pub fn clear_session(&self) {
        self.inner.store.clear();
        self.inner.auth_cache.invalidate();
        self.inner.reset_cooldown(true);
        self.inner.set_state(SessionState::Unknown);
    }

    /// Periodically rotate the pair before it expires
    pub fn spawn_refresh_loop(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let manager = self.clone();
        let period = self
            .inner
            .config
            .refresh_check_interval()
            .max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs(), "Token refresh loop started");

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!("Token refresh loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let due = manager
                            .current_pair()
                            .is_some_and(|pair| manager.needs_refresh(&pair));
                        if due {
                            if let Err(e) = manager.refresh().await {
                                debug!(error = %e, "Scheduled refresh failed");
                            }
                        }
                    }
                }
            }
        })
    }

    /// Stop the deferred attempt, if one is scheduled
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.reset_cooldown(true);
    }
}

impl ManagerInner {
    fn lock_cooldown(&self) -> MutexGuard<'_, CooldownState> {
        self.cooldown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, current = ?state, "Session state changed");
        }
    }

    fn needs_refresh(&self, pair: &TokenPair) -> bool {
        (pair.access_expires_at - Utc::now())
            .to_std()
            .map_or(true, |left| left <= self.config.refresh_threshold())
    }

    fn cooldown_remaining(&self) -> Option<Duration> {
        let until = self.lock_cooldown().until?;
        let left = until.saturating_duration_since(Instant::now());
        (!left.is_zero()).then_some(left)
    }

    /// Clear the cooldown; `abort` also cancels the deferred attempt
    fn reset_cooldown(&self, abort: bool) {
        let mut cooldown = self.lock_cooldown();
        cooldown.until = None;
        if let Some(handle) = cooldown.deferred.take() {
            if abort {
                handle.abort();
            }
        }
    }

    async fn run_refresh(self: Arc<Self>) -> Result<TokenPair, ClientError> {
        if let Some(left) = self.cooldown_remaining() {
            return Err(ClientError::CoolingDown {
                retry_in_seconds: left.as_secs().max(1),
            });
        }

        let pair = self.store.load().ok_or(ClientError::NoCredential)?;
        self.set_state(SessionState::Refreshing);

        let mut last_error = match self.attempt_rotation(&pair.refresh_token).await {
            Ok(fresh) => return Ok(self.on_refreshed(fresh)),
            Err(e) => e,
        };

        for (attempt, delay) in self.retry.delays().enumerate() {
            if !last_error.is_retryable() {
                break;
            }
            debug!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "Retrying token refresh"
            );
            time::sleep(delay).await;

            match self.attempt_rotation(&pair.refresh_token).await {
                Ok(fresh) => return Ok(self.on_refreshed(fresh)),
                Err(e) => last_error = e,
            }
        }

        self.enter_fallback(&last_error);
        Err(last_error)
    }

    /// One rotation through the breaker
    ///
    /// Only transport failures count against the breaker; a rejection
    /// proves the server is reachable.
    async fn attempt_rotation(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        self.breaker.acquire()?;

        let rotation = self.api.rotate(refresh_token);
        let result = match time::timeout(self.config.probe_timeout(), rotation).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };

        match &result {
            Err(e) if e.is_transport_failure() => self.breaker.record_failure(),
            _ => self.breaker.record_success(),
        }
        result
    }

    fn on_refreshed(&self, fresh: TokenPair) -> TokenPair {
        self.store.save(&fresh);
        // The deferred attempt may be the caller, so detach rather than abort
        self.reset_cooldown(false);
        self.auth_cache.store(true);
        self.set_state(SessionState::Authenticated);
        info!(session_id = %fresh.session_id, "Token pair refreshed");
        fresh
    }

    fn enter_fallback(self: &Arc<Self>, error: &ClientError) {
        let cooldown = self.retry.cooldown;
        {
            let mut state = self.lock_cooldown();
            state.until = Some(Instant::now() + cooldown);
            if let Some(previous) = state.deferred.take() {
                previous.abort();
            }
            state.deferred = Some(tokio::spawn(Arc::clone(self).deferred_refresh()));
        }

        warn!(
            error = %error,
            cooldown_secs = cooldown.as_secs(),
            "Token refresh failed, falling back to the server session"
        );
        self.set_state(SessionState::Fallback);
    }

    async fn deferred_refresh(self: Arc<Self>) {
        tokio::select! {
            _ = self.shutdown.cancelled() => return,
            _ = time::sleep(self.retry.cooldown) => {}
        }

        self.lock_cooldown().until = None;
        let inner = Arc::clone(&self);
        if let Err(e) = self
            .refreshes
            .run(REFRESH_KEY, move || inner.deferred_attempt())
            .await
        {
            debug!(error = %e, "Deferred refresh failed");
        }
    }

    /// Last attempt after the cooldown; a miss here ends the session unless
    /// the server still recognises it
    async fn deferred_attempt(self: Arc<Self>) -> Result<TokenPair, ClientError> {
        let result = match self.store.load() {
            Some(pair) => self.attempt_rotation(&pair.refresh_token).await,
            None => Err(ClientError::NoCredential),
        };

        match result {
            Ok(fresh) => Ok(self.on_refreshed(fresh)),
            Err(error) => {
                self.auth_cache.invalidate();
                if self.check_authentication().await {
                    warn!(error = %error, "Deferred refresh failed, server session still valid");
                    self.set_state(SessionState::Fallback);
                } else {
                    info!(error = %error, "Session expired");
                    self.store.clear();
                    self.set_state(SessionState::Expired);
                }
                Err(error)
            }
        }
    }

    async fn check_authentication(self: &Arc<Self>) -> bool {
        if let Some(cached) = self.auth_cache.get() {
            return cached;
        }
        let inner = Arc::clone(self);
        self.probes
            .run(AUTH_CHECK_KEY, move || inner.probe_once())
            .await
    }

    async fn probe_once(self: Arc<Self>) -> bool {
        if self.breaker.acquire().is_err() {
            debug!("Circuit open, skipping authentication probe");
            return false;
        }

        let outcome = match time::timeout(self.config.probe_timeout(), self.api.probe()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::Timeout),
        };

        let authenticated = match outcome {
            Ok(authenticated) => {
                self.breaker.record_success();
                authenticated
            }
            Err(error) => {
                if error.is_transport_failure() {
                    self.breaker.record_failure();
                } else {
                    self.breaker.record_success();
                }
                warn!(error = %error, "Authentication probe failed");
                false
            }
        };

        self.auth_cache.store(authenticated);
        authenticated
    }
}
