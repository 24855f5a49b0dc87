use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vodhub::api;
use vodhub::assets::HttpAssetStore;
use vodhub::config::Config;
use vodhub::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,vodhub=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::init()?;
    info!("Initialized configuration");

    // Initialize database and run pending migrations
    let db = init_database().await?;
    info!("Connected to database");

    // Client for the external media store
    let assets = Arc::new(HttpAssetStore::new(&config.assets)?);

    api::start_api_server(db.get_pool().clone(), assets).await?;

    info!("Shutdown complete");
    Ok(())
}
