//! Unit tests for the Redis client and store
//!
//! Tests marked `#[ignore]` need a running server; point `REDIS_URL` at it
//! and run with `--ignored`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use redis::{ErrorKind, RedisError};
use sg_core::RevocationStore;
use sg_shared::StorageConfig;

use crate::cache::redis_client::{is_retriable_error, RedisClient};
use crate::cache::revocation_store::expiry_seconds;
use crate::cache::RedisRevocationStore;

fn test_config() -> StorageConfig {
    let mut config = StorageConfig::default();
    if let Ok(url) = std::env::var("REDIS_URL") {
        config.redis_url = url;
    }
    config.key_prefix = format!("sg-test-{}:", std::process::id());
    config
}

#[test]
fn test_expiry_seconds_rounds_up() {
    let now = Utc::now();

    assert_eq!(expiry_seconds(now + Duration::milliseconds(1_200), now), 2);
    assert_eq!(expiry_seconds(now + Duration::seconds(3), now), 3);
    assert_eq!(expiry_seconds(now + Duration::milliseconds(1), now), 1);
    assert_eq!(expiry_seconds(now - Duration::seconds(5), now), 1);
}

#[test]
fn test_is_retriable_error() {
    let io_error = RedisError::from(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Connection refused",
    ));
    assert!(is_retriable_error(&io_error));

    let type_error = RedisError::from((ErrorKind::TypeError, "Invalid type"));
    assert!(!is_retriable_error(&type_error));
}

#[tokio::test]
async fn test_client_creation_with_invalid_url() {
    let mut config = StorageConfig::default();
    config.redis_url = "invalid://url".into();

    assert!(RedisClient::new(&config).await.is_err());
}

#[tokio::test]
#[ignore] // Requires actual Redis server
async fn test_revocation_is_set_nx() {
    let client = Arc::new(RedisClient::new(&test_config()).await.unwrap());
    client.ping().await.unwrap();
    let store = RedisRevocationStore::new(client);
    let hash = format!("digest-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let expires_at = Utc::now() + Duration::seconds(30);

    assert!(store.revoke(&hash, expires_at).await.unwrap());
    assert!(!store.revoke(&hash, expires_at).await.unwrap());
    assert!(store.is_revoked(&hash).await.unwrap());
    assert!(store.count().await.unwrap() >= 1);
    assert_eq!(store.purge_expired().await.unwrap(), 0);
}
