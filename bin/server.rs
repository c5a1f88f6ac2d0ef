// Prestige - Web Server
// Serves matchups, votes and rankings over HTTP

use anyhow::{Context, Result};
use std::sync::Arc;

use prestige::api::{router, AppState};
use prestige::telemetry::init_tracing;
use prestige::{MatchupGenerator, ServerConfig, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    tracing::info!(db = %config.db_path.display(), "database opened");

    // Seeded once per process; never reseeded per request
    let state = AppState::new(Arc::new(store), MatchupGenerator::from_entropy());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, version = prestige::VERSION, "prestige server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("Server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
