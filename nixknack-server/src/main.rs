//! NixKnack Service

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nixknack_server::{
    load_seed_data, planner, routes, AppState, Config, InMemoryStore, SqliteStore, Store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nixknack_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    match config.database.clone() {
        Some(path) => {
            tracing::info!(%path, "Using SQLite store");
            serve(SqliteStore::open(&path)?, config).await
        }
        None => {
            tracing::warn!("No database configured; data will not survive a restart");
            serve(InMemoryStore::new(), config).await
        }
    }
}

async fn serve<S: Store + 'static>(store: S, config: Config) -> Result<()> {
    if config.seed_on_start {
        load_seed_data(&store)?;
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(store, config));

    planner::spawn_expiry_sweep(state.clone());

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("NixKnack listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
