mod app;
mod routes;
mod services;
mod types;
mod utils;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bus_arrivals_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting app...");
    let config = app::AppConfig::from_env()?;
    if config.transit_api_key.is_none() {
        warn!("TRANSIT_API_KEY is not set, arrival lookups will fail until it is");
    }

    let bind_addr = config.bind_addr.clone();
    let state = app::gen_state(config);

    // The catalog retries lazily on the next request if this fails.
    if let Err(e) = state.catalog.load().await {
        error!("Failed to load stop catalog from {}: {}", state.catalog.source(), e);
    }

    let live_boards = state.live_boards.clone();
    let app = app::gen_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
            // Live streams only end once their boards do.
            live_boards.shutdown_all().await;
        })
        .await?;

    Ok(())
}
