//! Rate limiting trait for token issuance

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Outcome of an issuance attempt against the limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Attempt recorded; `remaining` further attempts fit in the window
    Allowed { remaining: u32 },
    /// Limit reached; the attempt was not recorded
    Limited { retry_after_seconds: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Per-key sliding window limiter for token issuance
#[async_trait]
pub trait IssuanceRateLimiter: Send + Sync {
    /// Check the window for `key` and record the attempt if allowed.
    ///
    /// Check and record are one atomic step, so concurrent issuances for
    /// the same key cannot overrun the limit.
    async fn check_and_record(&self, key: &str) -> DomainResult<RateLimitDecision>;
}
