//! Cached outcome of the authentication probe
//!
//! Positive and negative results have different lifetimes so a transient
//! failure is forgotten quickly while a confirmed session spares the server
//! repeated probes.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use sg_shared::config::AuthCacheSettings;

#[derive(Debug, Clone, Copy)]
struct CachedCheck {
    authenticated: bool,
    stored_at: Instant,
    ttl: Duration,
}

#[derive(Debug)]
pub struct AuthCheckCache {
    entry: Mutex<Option<CachedCheck>>,
    success_ttl: Duration,
    failure_ttl: Duration,
}

impl AuthCheckCache {
    pub fn new(success_ttl: Duration, failure_ttl: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            success_ttl,
            failure_ttl,
        }
    }

    /// The cached result, if still fresh
    pub fn get(&self) -> Option<bool> {
        let mut entry = self.lock();
        match *entry {
            Some(cached) if cached.stored_at.elapsed() < cached.ttl => Some(cached.authenticated),
            Some(_) => {
                *entry = None;
                None
            }
            None => None,
        }
    }

    pub fn store(&self, authenticated: bool) {
        let ttl = if authenticated {
            self.success_ttl
        } else {
            self.failure_ttl
        };
        *self.lock() = Some(CachedCheck {
            authenticated,
            stored_at: Instant::now(),
            ttl,
        });
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedCheck>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&AuthCacheSettings> for AuthCheckCache {
    fn from(settings: &AuthCacheSettings) -> Self {
        Self::new(settings.success_ttl(), settings.failure_ttl())
    }
}
