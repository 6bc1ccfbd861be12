//! Unit tests for the in-memory sliding window limiter

use std::sync::Arc;
use std::time::Duration;

use sg_core::{IssuanceRateLimiter, RateLimitDecision};
use sg_shared::config::rate_limit::TokenRateLimits;

use crate::services::auth::InMemoryRateLimiter;

#[tokio::test(start_paused = true)]
async fn test_sixth_attempt_in_window_is_refused() {
    let limiter = InMemoryRateLimiter::from(&TokenRateLimits::default());

    for expected_remaining in (0..5).rev() {
        assert_eq!(
            limiter.check_and_record("token_issue:u1").await.unwrap(),
            RateLimitDecision::Allowed { remaining: expected_remaining }
        );
    }

    assert_eq!(
        limiter.check_and_record("token_issue:u1").await.unwrap(),
        RateLimitDecision::Limited { retry_after_seconds: 900 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_window_slides() {
    let limiter = InMemoryRateLimiter::new(2, Duration::from_secs(60));

    limiter.check_and_record("k").await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    limiter.check_and_record("k").await.unwrap();

    let decision = limiter.check_and_record("k").await.unwrap();
    assert_eq!(decision, RateLimitDecision::Limited { retry_after_seconds: 30 });

    // The first attempt leaves the window
    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(limiter.check_and_record("k").await.unwrap().is_allowed());
    assert_eq!(limiter.attempts("k"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refused_attempts_are_not_recorded() {
    let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));

    limiter.check_and_record("k").await.unwrap();
    for _ in 0..10 {
        assert!(!limiter.check_and_record("k").await.unwrap().is_allowed());
    }
    assert_eq!(limiter.attempts("k"), 1);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(limiter.check_and_record("k").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_keys_are_independent() {
    let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(60));

    assert!(limiter.check_and_record("a").await.unwrap().is_allowed());
    assert!(limiter.check_and_record("b").await.unwrap().is_allowed());
    assert!(!limiter.check_and_record("a").await.unwrap().is_allowed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attempts_never_overrun() {
    let limiter = Arc::new(InMemoryRateLimiter::new(5, Duration::from_secs(900)));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.check_and_record("k").await.unwrap().is_allowed() })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}
