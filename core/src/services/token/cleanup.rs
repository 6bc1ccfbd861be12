//! Periodic garbage collection of the revocation set
//!
//! Entries are only removed once the revoked token has expired on its own,
//! so a sweep can never resurrect a token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::RevocationStore;

/// Configuration for the revocation cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

/// Service purging expired revocation entries
pub struct TokenCleanupService<S: RevocationStore + 'static> {
    store: Arc<S>,
    config: TokenCleanupConfig,
}

impl<S: RevocationStore> TokenCleanupService<S> {
    /// Create a new cleanup service over `store`
    pub fn new(store: Arc<S>, config: TokenCleanupConfig) -> Self {
        Self { store, config }
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the sweep
    /// * `Err(DomainError)` - If the store could not be counted afterwards
    pub async fn run_cleanup(&self) -> Result<CleanupResult, DomainError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let mut result = CleanupResult::default();

        match self.store.purge_expired().await {
            Ok(count) => result.revocations_purged = count,
            Err(e) => {
                error!("Failed to purge revocation set: {}", e);
                result.errors.push(format!("Revocation purge error: {}", e));
            }
        }

        result.revocations_remaining = self.store.count().await?;

        info!(
            purged = result.revocations_purged,
            remaining = result.revocations_remaining,
            "Revocation cleanup completed"
        );

        Ok(result)
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when cleanup is disabled. The first sweep runs
    /// immediately.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Revocation cleanup service is disabled");
            return None;
        }

        let interval = Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "Revocation cleanup service started"
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) if !result.is_success() => {
                        warn!("Cleanup completed with errors: {:?}", result.errors);
                    }
                    Ok(_) => {}
                    Err(e) => error!("Revocation cleanup cycle failed: {}", e),
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired entries removed
    pub revocations_purged: usize,
    /// Number of entries still held after the sweep
    pub revocations_remaining: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
