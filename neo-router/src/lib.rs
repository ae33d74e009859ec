pub mod aggregator;
pub mod api;
pub mod chunker;
pub mod config;
pub mod details;
pub mod errors;
pub mod lookup;
pub mod metrics_defs;
pub mod types;
pub mod upstream;

#[cfg(test)]
mod testutils;

use crate::api::AppState;
use crate::config::Config;
use crate::details::DetailsService;
use crate::errors::Result;
use crate::lookup::AsteroidLookupService;
use crate::upstream::NeoWsClient;
use favourites::FavouritesGateway;
use shared::admin_service::admin_router;
use shared::http::{bind, serve, shutdown_signal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let upstream = Arc::new(NeoWsClient::new(&config.upstream));
    let store = favourites::open_store(&config.favourites_store).await?;

    let state = AppState {
        lookup: Arc::new(AsteroidLookupService::new(
            upstream.clone(),
            config.upstream.max_concurrent_requests,
        )),
        details: Arc::new(DetailsService::new(upstream, &config.details_cache)),
        favourites: FavouritesGateway::new(store),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    };

    let listener = bind(&config.listener.host, config.listener.port).await?;
    let admin_listener = bind(&config.admin_listener.host, config.admin_listener.port).await?;

    let ready = Arc::new(AtomicBool::new(false));
    let admin = admin_router({
        let ready = ready.clone();
        move || ready.load(Ordering::Relaxed)
    });

    tracing::info!(
        upstream = %config.upstream.url,
        max_concurrent_requests = config.upstream.max_concurrent_requests,
        "Starting neo-router"
    );
    ready.store(true, Ordering::Relaxed);

    tokio::try_join!(
        serve(listener, api::router(state), shutdown_signal()),
        serve(admin_listener, admin, shutdown_signal()),
    )?;

    tracing::info!("neo-router stopped");
    Ok(())
}
