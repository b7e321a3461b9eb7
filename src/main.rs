use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webrss::cache;
use webrss::config::{Args, Config};
use webrss::fetcher::{start_background_refresh, Fetcher};
use webrss::routes::{self, AppState};
use webrss::store::SnapshotStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webrss=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_args(Args::parse())?;
    info!("Loaded {} feeds from configuration", config.urls.len());

    // Restore the previous snapshot; a corrupt file stops startup
    let store = SnapshotStore::new(&config.cache_path);
    let restored = store
        .load()
        .await
        .with_context(|| format!("Failed to restore {}", config.cache_path.display()))?;

    let cache = cache::spawn(store);

    // Create fetcher
    let fetcher =
        Arc::new(Fetcher::new(config.fetch.clone()).context("Failed to build HTTP client")?);
    info!(
        concurrency = fetcher.settings().concurrency,
        timeout = ?fetcher.settings().timeout,
        interval = ?config.poll_interval,
        "Feed fetcher ready"
    );

    // Start background refresh task
    tokio::spawn(start_background_refresh(
        fetcher,
        cache.clone(),
        Arc::new(config.urls.clone()),
        config.poll_interval,
        restored,
    ));

    // Create app state
    let state = Arc::new(AppState {
        cache,
        recent_window: config.recent_window,
    });

    let app = routes::router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.http_addr))?;
    info!("Server starting on http://{}", config.http_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
