//! Sliding window rate limiters for token issuance

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use sg_core::{DomainResult, IssuanceRateLimiter, RateLimitDecision};
use sg_shared::config::rate_limit::TokenRateLimits;

/// In-memory sliding window limiter
///
/// Each key holds the instants of its recorded attempts inside the window.
/// Refused attempts are not recorded, so a caller hammering the limit does
/// not extend its own lockout.
pub struct InMemoryRateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    max_attempts: u32,
    window: Duration,
}

impl InMemoryRateLimiter {
    /// Create a limiter allowing `max_attempts` per `window`
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// Attempts currently counted for `key`
    pub fn attempts(&self, key: &str) -> usize {
        let now = Instant::now();
        self.windows.get(key).map_or(0, |window| {
            window
                .iter()
                .filter(|at| now.duration_since(**at) < self.window)
                .count()
        })
    }
}

impl From<&TokenRateLimits> for InMemoryRateLimiter {
    fn from(limits: &TokenRateLimits) -> Self {
        Self::new(limits.max_attempts, Duration::from_secs(limits.window_seconds))
    }
}

#[async_trait]
impl IssuanceRateLimiter for InMemoryRateLimiter {
    async fn check_and_record(&self, key: &str) -> DomainResult<RateLimitDecision> {
        let now = Instant::now();
        let mut window = self.windows.entry(key.to_string()).or_default();

        while window
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            window.pop_front();
        }

        if window.len() >= self.max_attempts as usize {
            let retry_after = window
                .front()
                .map_or(self.window, |oldest| {
                    self.window.saturating_sub(now.duration_since(*oldest))
                });
            let retry_after_seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            debug!(key, retry_after_seconds, "Issuance window full");
            return Ok(RateLimitDecision::Limited {
                retry_after_seconds: retry_after_seconds.max(1),
            });
        }

        window.push_back(now);
        Ok(RateLimitDecision::Allowed {
            remaining: self.max_attempts - window.len() as u32,
        })
    }
}

#[cfg(feature = "redis-cache")]
pub use redis_limiter::RedisRateLimiter;

#[cfg(feature = "redis-cache")]
mod redis_limiter {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use redis::Script;
    use tracing::warn;

    use sg_core::{DomainResult, IssuanceRateLimiter, RateLimitDecision};
    use sg_shared::config::rate_limit::TokenRateLimits;

    use crate::cache::RedisClient;
    use crate::InfrastructureError;

    /// Trim, count and insert in one server-side step.
    /// Returns `{1, remaining}` when recorded, `{0, retry_after_ms}` when full.
    const SLIDING_WINDOW: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
if count >= limit then
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  local retry = window
  if oldest[2] then retry = tonumber(oldest[2]) + window - now end
  return {0, retry}
end
redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return {1, limit - count - 1}
"#;

    /// Redis sorted-set sliding window limiter shared by all instances
    pub struct RedisRateLimiter {
        redis_client: Arc<RedisClient>,
        limits: TokenRateLimits,
        script: Script,
        sequence: AtomicU64,
    }

    impl RedisRateLimiter {
        /// Create a new Redis-based rate limiter
        pub fn new(redis_client: Arc<RedisClient>, limits: TokenRateLimits) -> Self {
            Self {
                redis_client,
                limits,
                script: Script::new(SLIDING_WINDOW),
                sequence: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl IssuanceRateLimiter for RedisRateLimiter {
        async fn check_and_record(&self, key: &str) -> DomainResult<RateLimitDecision> {
            let now = Utc::now().timestamp_millis();
            let member = format!(
                "{}:{}:{}",
                now,
                std::process::id(),
                self.sequence.fetch_add(1, Ordering::Relaxed)
            );
            let mut conn = self.redis_client.connection();

            let reply: Vec<i64> = self
                .script
                .key(self.redis_client.key(&format!("rate_limit:{}", key)))
                .arg(now)
                .arg(self.limits.window_seconds as i64 * 1000)
                .arg(self.limits.max_attempts)
                .arg(member)
                .invoke_async(&mut conn)
                .await
                .map_err(InfrastructureError::from)?;

            match reply.as_slice() {
                [1, remaining] => Ok(RateLimitDecision::Allowed {
                    remaining: (*remaining).max(0) as u32,
                }),
                [_, retry_ms] => {
                    let retry_after_seconds = ((*retry_ms).max(0) as u64).div_ceil(1000).max(1);
                    warn!(key, retry_after_seconds, "Issuance window full");
                    Ok(RateLimitDecision::Limited { retry_after_seconds })
                }
                _ => Err(InfrastructureError::Config(format!(
                    "Unexpected rate limit reply: {:?}",
                    reply
                ))
                .into()),
            }
        }
    }
}
