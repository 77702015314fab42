use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing::{info, warn};

use stockfish_integration::StockfishEngine;
use storage::{PositionCatalog, SessionStore};
use trainer_api::ApiContext;

mod api;
mod app_state;
mod config;

use api::build_router;
use app_state::AppState;
use config::{engine_path_candidates, load_settings};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let engine = spawn_engine(&settings).await?;

    let sessions = SessionStore::new(chrono::Duration::seconds(settings.session_ttl_seconds));
    let api = ApiContext {
        catalog: Arc::new(PositionCatalog::new()),
        sessions: sessions.clone(),
        engine: Arc::new(engine),
    };

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            sessions.evict_expired();
        }
    });

    let app = build_router(AppState { api });
    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "endgame trainer listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Probes the configured path and the usual install locations; the first
/// binary that completes the UCI handshake wins.
async fn spawn_engine(settings: &config::Settings) -> anyhow::Result<StockfishEngine> {
    let timeout = Duration::from_millis(settings.engine_timeout_ms);
    for candidate in engine_path_candidates(settings.stockfish_path.as_deref()) {
        match StockfishEngine::spawn(&candidate, settings.search_depth, timeout).await {
            Ok(engine) => return Ok(engine),
            Err(error) => warn!(%candidate, %error, "engine candidate failed"),
        }
    }
    anyhow::bail!("no usable stockfish binary found; install stockfish or set STOCKFISH_PATH")
}
