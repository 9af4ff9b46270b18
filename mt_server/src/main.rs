//! Maintenance tracking REST backend.
//!
//! Wires the auth and anti-abuse components to their Postgres repositories
//! and the shared TTL store, then serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use maintrack::auth::{CredentialStore, SessionService, TokenCodec};
use maintrack::db::repository::{
    MovementRepository, PgMovementRepository, PgUserRepository, UserRepository,
};
use maintrack::db::Database;
use maintrack::guard::{DedupGuard, LockoutGuard, RevocationLedger};
use maintrack::store::{MemoryStore, TtlStore};
use mt_server::config::ServerConfig;
use mt_server::{api, logging, metrics};
use pico_args::Arguments;

const HELP: &str = "\
Run the maintenance tracking backend

USAGE:
  mt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required)
  PASSWORD_PEPPER          Password hashing pepper (required)
  METRICS_BIND             Prometheus exporter bind address (optional)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Metrics exporter listening on {addr}");
    }

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    let pool = db.pool().clone();
    tracing::info!("Database connected");

    let store: Arc<dyn TtlStore> = Arc::new(MemoryStore::new());
    let op_timeout = config.guards.op_timeout();

    let codec = Arc::new(TokenCodec::new(
        &config.security.jwt_secret,
        config.signing_algorithm(),
        config.security.token_issuer.clone(),
        config.security.token_audience.clone(),
    ));
    let revocations = Arc::new(RevocationLedger::new(store.clone(), op_timeout));
    let lockout = Arc::new(LockoutGuard::new(
        store.clone(),
        config.lockout.to_guard_config(),
        op_timeout,
    ));
    let dedup = Arc::new(DedupGuard::new(store.clone(), op_timeout));

    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let movements: Arc<dyn MovementRepository> = Arc::new(PgMovementRepository::new(pool));

    let sessions = Arc::new(SessionService::new(
        users.clone(),
        CredentialStore::new(config.security.password_pepper.clone()),
        codec.clone(),
        revocations.clone(),
        lockout,
        chrono::Duration::minutes(config.security.access_token_expire_minutes),
        chrono::Duration::days(config.security.refresh_token_expire_days),
    ));

    let state = api::AppState {
        sessions,
        codec,
        users,
        movements,
        revocations,
        dedup,
        guards: config.guards.clone(),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
