//! Backend entry-point: loads settings, prepares storage and runs the HTTP server.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use std::env;
use std::io;
use std::net::SocketAddr;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use icare::inbound::http::health::HealthState;
use icare::inbound::http::session_config::{BuildMode, key_fingerprint, session_settings_from_env};
use icare::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use icare::settings::Settings;
use server::{ServerConfig, create_server};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    info!(fingerprint = %key_fingerprint(&session.key), "session key loaded");

    let settings = Settings::load().map_err(io::Error::other)?;
    let bind_addr = bind_addr()?;

    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        settings,
    );
    let config = match database_url() {
        Some(url) => config.with_db_pool(prepare_database(url).await?),
        None => config,
    };
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::prometheus_metrics());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "listening");
    server.await
}

fn bind_addr() -> io::Result<SocketAddr> {
    let raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
    raw.parse().map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid BIND_ADDR '{raw}': {error}"),
        )
    })
}

fn database_url() -> Option<String> {
    env::var("DATABASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Apply pending migrations, then open the async pool.
async fn prepare_database(url: String) -> io::Result<DbPool> {
    let migration_url = url.clone();
    let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .map_err(|error| io::Error::other(format!("migration task failed: {error}")))?
        .map_err(io::Error::other)?;
    info!(count = applied.len(), migrations = ?applied, "database migrations applied");

    DbPool::new(PoolConfig::new(url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))
}
