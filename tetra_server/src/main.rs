//! Tournament registration server.
//!
//! Serves the tournament HTTP API backed by PostgreSQL (or an in-memory
//! store) and the public TETR.IO API.

use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use tetra_server::{
    api,
    config::{Overrides, ServerConfig},
    logging,
};
use tetra_tourney::{
    db::{Database, InMemoryStore, PgPlayerRepository, PgTournamentRepository},
    tetrio::TetrioClient,
    tournament::TournamentManager,
};

const HELP: &str = "\
Run the TETR.IO tournament registration server

USAGE:
  tetra_server [OPTIONS]

OPTIONS:
  --bind        IP:PORT    Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url      URL        Database connection string  [default: env DATABASE_URL]
  --tetrio-url  URL        TETR.IO API root            [default: env TETRIO_API_URL or https://ch.tetr.io/api]

FLAGS:
  --in-memory              Keep all data in memory (nothing is persisted)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL               PostgreSQL connection string
  DB_MAX_CONNECTIONS         Pool size
  TETRIO_TIMEOUT_SECS        TETR.IO request timeout
  TETRIO_USER_AGENT          User agent sent to TETR.IO
  REGISTRATION_MAX_ATTEMPTS  Retries when a tournament changes mid-registration
  RUST_LOG                   Log filter (e.g., info,tetra_tourney=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        tetrio_url: pargs.opt_value_from_str("--tetrio-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let provider = Arc::new(TetrioClient::new(&config.tetrio).context("Failed to build TETR.IO client")?);

    let manager = if config.in_memory {
        info!("Using in-memory store; data is lost on shutdown");
        let store = Arc::new(InMemoryStore::new());
        TournamentManager::new(store.clone(), store, provider)
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.ensure_schema().await.context("Failed to apply schema")?;
        info!("Database connected successfully");

        let pool = db.pool().clone();
        TournamentManager::new(
            Arc::new(PgTournamentRepository::new(pool.clone())),
            Arc::new(PgPlayerRepository::new(pool)),
            provider,
        )
    };
    let manager = manager.with_max_attempts(config.registration.max_attempts);

    let app = api::create_router(api::AppState {
        manager: Arc::new(manager),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("Server is running at http://{}. Press Ctrl+C to stop.", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
