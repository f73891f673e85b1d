use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mbta_server::api::MbtaApi;
use mbta_server::cache::{CacheStore, DiskStore, MemoryStore, SystemClock};
use mbta_server::config::AppConfig;
use mbta_server::fetcher::CachedFetcher;
use mbta_server::mbta::MbtaClient;
use mbta_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    if config.mbta.api_key.is_none() {
        warn!("MBTA_API_KEY not set, using anonymous rate limits");
    }

    let client = MbtaClient::new(config.mbta.clone())?;

    let store: Arc<dyn CacheStore> = match &config.cache.path {
        Some(path) => {
            let store = DiskStore::open(path.clone(), config.cache.stale_grace).await;
            info!(path = %path.display(), entries = store.len().await, "Opened disk cache");
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new(&config.cache)),
    };

    let fetcher = CachedFetcher::new(
        Arc::new(client),
        store,
        Arc::new(SystemClock),
        config.fetch.clone(),
    );
    let api = MbtaApi::new(fetcher);

    // Warm the stop index so the first schedule view is fast
    match api.stop_index().await {
        Ok(index) => info!(stops = index.len(), "Loaded MBTA stop names"),
        Err(e) => warn!(error = %e, "Could not load MBTA stop names, will retry on demand"),
    }

    let app = create_router(AppState::new(api), &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "MBTA server listening");
    info!("Open http://{}/mbta in your browser", config.listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
