//! Circuit breaker guarding network authentication calls
//!
//! CLOSED counts consecutive failures and opens at `max_failures`. OPEN
//! rejects every call until `reset_timeout` has passed since the last
//! failure; the first call observed after that is let through as the single
//! HALF_OPEN trial. There is no timer: transitions happen when the state is
//! checked.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use sg_shared::config::CircuitBreakerSettings;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    trial_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    max_failures: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(max_failures: u32, reset_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
            max_failures: max_failures.max(1),
            reset_timeout,
        }
    }

    /// Ask permission for one network call
    ///
    /// # Returns
    /// * `Ok(())` - The call may proceed; report its outcome with
    ///   [`record_success`](Self::record_success) or
    ///   [`record_failure`](Self::record_failure)
    /// * `Err(ClientError::CircuitOpen)` - The call must not be made
    pub fn acquire(&self) -> Result<(), ClientError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                if self.cooled(&inner) {
                    debug!("Circuit half-open, allowing one trial call");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    Ok(())
                } else {
                    Err(ClientError::CircuitOpen)
                }
            }
            CircuitState::HalfOpen if !inner.trial_in_flight => {
                inner.trial_in_flight = true;
                Ok(())
            }
            CircuitState::HalfOpen => Err(ClientError::CircuitOpen),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            debug!("Circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());
        inner.trial_in_flight = false;

        match inner.state {
            CircuitState::HalfOpen => {
                warn!("Trial call failed, circuit re-opened");
                inner.state = CircuitState::Open;
            }
            CircuitState::Closed if inner.failure_count >= self.max_failures => {
                warn!(failures = inner.failure_count, "Circuit opened");
                inner.state = CircuitState::Open;
            }
            _ => {}
        }
    }

    /// State as the next [`acquire`](Self::acquire) would see it
    ///
    /// An OPEN breaker whose `reset_timeout` has passed reports HALF_OPEN,
    /// although the transition itself only happens on `acquire`.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let state = match inner.state {
            CircuitState::Open if self.cooled(&inner) => CircuitState::HalfOpen,
            state => state,
        };
        BreakerSnapshot {
            state,
            failure_count: inner.failure_count,
        }
    }

    fn cooled(&self, inner: &BreakerState) -> bool {
        inner
            .last_failure
            .map_or(true, |at| at.elapsed() >= self.reset_timeout)
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreaker {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self::new(settings.max_failures, settings.reset_timeout())
    }
}
