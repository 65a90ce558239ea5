use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::{NominatimGeocoder, WorldCache};

mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            std::process::exit(2);
        }
    };

    let http = reqwest::Client::new();
    let geocoder = NominatimGeocoder::new(http.clone())
        .with_endpoint(config.geocoder_url.clone())
        .with_user_agent(config.geocoder_user_agent.clone())
        .with_limit(config.geocode_limit);
    let world = WorldCache::standard(&config.world_bundle_path, config.world_cdn_url.clone(), http);

    let state = AppState {
        geocoder: Arc::new(geocoder),
        world: Arc::new(world),
    };

    // Warm the cache so the first render does not pay for the download.
    let warm = state.world.clone();
    tokio::spawn(async move {
        warm.load_or_empty().await;
    });

    let app = routes::router(state);

    info!(
        "perspective server listening on http://{} (bundle {})",
        config.addr,
        config.world_bundle_path.display()
    );
    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.addr);
            std::process::exit(1);
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        error!("server error: {err}");
    }
}
