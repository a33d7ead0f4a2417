use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storyverse_recommendations::{
    config::Config,
    db::{create_pool, create_redis_client, PgHistoryStore, RecommendationCache, RedisCache},
    routes::{create_router, AppState},
    services::{RecommendationEngine, ServiceCatalog, ThreadRngShuffler},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "storyverse_recommendations=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    // Store handles are owned here and injected; the engine never opens its own
    let pool = create_pool(&config.database_url)?;
    let history = Arc::new(PgHistoryStore::new(pool));
    let catalog = Arc::new(ServiceCatalog::new(
        config.universe_service_url.clone(),
        config.character_service_url.clone(),
    ));

    let (cache, cache_writer) = if config.cache_enabled {
        let client = create_redis_client(&config.redis_url)?;
        let (store, writer) = RedisCache::new(client, Duration::from_millis(config.cache_timeout_ms));
        (RecommendationCache::new(Arc::new(store)), Some(writer))
    } else {
        tracing::warn!("Cache disabled, every request recomputes");
        (RecommendationCache::disabled(), None)
    };

    let engine = RecommendationEngine::new(cache, history, catalog, Arc::new(ThreadRngShuffler));
    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let address = listener.local_addr()?;
    tracing::info!(
        address = %address,
        universe_service = %config.universe_service_url,
        cache_enabled = config.cache_enabled,
        "Recommendation service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
