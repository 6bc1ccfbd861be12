//! Issuance rate limiting backends

mod rate_limiter;

#[cfg(test)]
mod tests;

pub use rate_limiter::InMemoryRateLimiter;
#[cfg(feature = "redis-cache")]
pub use rate_limiter::RedisRateLimiter;
