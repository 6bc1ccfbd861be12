use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use sg_api::{create_app, telemetry::init_tracing, AppState, CookieTransport};
use sg_core::{
    AccountLockPolicy, AuthService, IssuanceRateLimiter, RevocationStore, TokenCleanupConfig,
    TokenCleanupService, TokenService, TokenServiceConfig,
};
use sg_infra::{InMemoryIdentityRepository, InMemoryRateLimiter, InMemoryRevocationStore};
use sg_shared::{AppConfig, StorageBackend};

#[cfg(feature = "redis-cache")]
use sg_infra::{RedisClient, RedisRateLimiter, RedisRevocationStore};

/// Work factor for hashing seeded passwords at startup
const SEED_BCRYPT_COST: u32 = 12;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("SG_CONFIG").ok();
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;

    init_tracing(&config.logging).context("installing tracing subscriber")?;
    info!(
        environment = %config.environment,
        backend = ?config.storage.backend,
        "Starting SessionGuard API"
    );

    let identities = Arc::new(
        InMemoryIdentityRepository::from_seed(&config.storage.seed_identities, SEED_BCRYPT_COST)
            .context("seeding identities")?,
    );

    match config.storage.backend {
        StorageBackend::Memory => {
            let revocations = Arc::new(InMemoryRevocationStore::new());
            let limiter = Arc::new(InMemoryRateLimiter::from(&config.rate_limit.token));
            run_server(config, identities, revocations, limiter).await
        }
        #[cfg(feature = "redis-cache")]
        StorageBackend::Redis => {
            info!(url = %config.storage.masked_redis_url(), "Connecting to Redis");
            let client = Arc::new(
                RedisClient::new(&config.storage)
                    .await
                    .context("connecting to Redis")?,
            );
            let revocations = Arc::new(RedisRevocationStore::new(client.clone()));
            let limiter = Arc::new(RedisRateLimiter::new(client, config.rate_limit.token.clone()));
            run_server(config, identities, revocations, limiter).await
        }
        #[cfg(not(feature = "redis-cache"))]
        StorageBackend::Redis => {
            anyhow::bail!("Redis backend requested but sg_api was built without `redis-cache`")
        }
    }
}

async fn run_server<S, L>(
    config: AppConfig,
    identities: Arc<InMemoryIdentityRepository>,
    revocations: Arc<S>,
    limiter: Arc<L>,
) -> anyhow::Result<()>
where
    S: RevocationStore + 'static,
    L: IssuanceRateLimiter + 'static,
{
    let token_config = TokenServiceConfig::from_shared(&config.auth.jwt, &config.rate_limit)
        .context("building token service configuration")?;
    let tokens = Arc::new(TokenService::new(revocations.clone(), limiter, token_config));
    let auth_service = Arc::new(AuthService::new(
        identities,
        tokens,
        AccountLockPolicy::from(&config.rate_limit.auth),
    ));

    let cleanup = Arc::new(TokenCleanupService::new(
        revocations,
        TokenCleanupConfig {
            interval_seconds: config.server.revocation_cleanup_interval,
            enabled: true,
        },
    ));
    let cleanup_task = cleanup.start_background_task();

    let state = web::Data::new(AppState::new(
        auth_service,
        CookieTransport::new(config.auth.cookie.clone()),
    ));
    let cors = config.cors.clone();
    let bind_address = config.server.bind_address();
    info!(address = %bind_address, "HTTP server listening");

    let mut server = HttpServer::new(move || create_app(state.clone(), &cors));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    server.bind(&bind_address)?.run().await?;

    if let Some(task) = cleanup_task {
        task.abort();
    }
    info!("Server stopped");
    Ok(())
}
