//! reflectd - HTTP API server for reflect
//!
//! Serves the journaling REST API: entry CRUD, analytics, and on-demand
//! cognitive distortion analysis.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reflect_core::provider::{AnalysisProvider, GeminiProvider};
use reflect_core::{Config, Database};
use reflect_server::api;

#[derive(Parser, Debug)]
#[command(name = "reflectd", version, about = "Journaling API server")]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "REFLECT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long, env = "REFLECT_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _log_guard =
        reflect_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("reflectd starting up");

    let db_path = config.database.resolved_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    // The server runs without a provider; analysis endpoints report the
    // gap instead of failing startup.
    let provider: Option<Arc<dyn AnalysisProvider>> = if config.provider.is_ready() {
        let gemini =
            GeminiProvider::new(config.provider.clone()).context("failed to create provider")?;
        tracing::info!(model = %config.provider.model, "Analysis provider ready");
        Some(Arc::new(gemini))
    } else {
        tracing::warn!("No provider API key configured; analysis endpoints disabled");
        None
    };

    let addr = format!("{}:{}", config.server.bind_addr, config.server.port);
    let state = Arc::new(api::AppState {
        db,
        provider,
        config,
    });

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
