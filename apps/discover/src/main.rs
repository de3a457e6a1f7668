mod algorithm;
mod config;
mod db;
mod discover;
mod errors;
mod lifecycle;
mod models;
mod pets;
mod routes;
mod shopping;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::discover::handle::SessionRegistry;
use crate::routes::build_router;
use crate::shopping::ShoppingClient;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting discover v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the goods store
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; goods, history and profiles are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // Initialize the marketplace client
    let shopping = ShoppingClient::new(
        config.shopping_api_host.clone(),
        config.shopping_client_id.clone(),
        config.shopping_client_secret.clone(),
        Duration::from_secs(config.shopping_timeout_secs),
    )?;
    info!("Shopping client initialized (host: {})", config.shopping_api_host);
    info!(
        "Discover queue: {:?}, {} terms per session, idle sessions kept {}s",
        config.queue_order, config.term_count, config.session_ttl_secs
    );

    let state = AppState {
        store,
        shopping: Arc::new(shopping),
        config: config.clone(),
        sessions: Arc::new(SessionRegistry::new(config.session_ttl())),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
