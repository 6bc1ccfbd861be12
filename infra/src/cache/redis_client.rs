//! Redis client wrapper with key namespacing

use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tracing::info;

use sg_shared::StorageConfig;

use crate::InfrastructureError;

/// Redis client shared by the Redis-backed stores
///
/// Holds a multiplexed connection; clones of it share one socket.
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisClient {
    /// Connect to the configured Redis server
    ///
    /// # Returns
    /// * `Ok(RedisClient)` - Connected client
    /// * `Err(InfrastructureError)` - Invalid URL or unreachable server
    pub async fn new(config: &StorageConfig) -> Result<Self, InfrastructureError> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let connection = client.get_multiplexed_tokio_connection().await?;

        info!(url = %config.masked_redis_url(), "Connected to Redis");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// A handle on the shared connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Namespaced key
    pub fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.key_prefix, suffix)
    }

    /// Round-trip check used by the health endpoint
    pub async fn ping(&self) -> Result<(), InfrastructureError> {
        let mut conn = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Whether an operation failing with `err` may succeed on retry
pub fn is_retriable_error(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_timeout()
}
