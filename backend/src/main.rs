//! Backend entry-point: loads configuration, prepares storage and serves
//! the HTTP API.

use std::net::SocketAddr;

use actix_web::web;
use color_eyre::eyre::{Context as _, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig as _;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use doctrack::inbound::http::health::HealthState;
use doctrack::inbound::http::session_config::{BuildMode, session_settings_from_env};
use doctrack::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use doctrack::server::{Persistence, ServerConfig, create_server};
use doctrack::settings::AppSettings;
use doctrack::startup::seed_accounts;

async fn connect(settings: &AppSettings) -> Result<Persistence> {
    let Some(url) = settings.database_url() else {
        warn!("no database configured; state is held in memory and lost on restart");
        return Ok(Persistence::in_memory());
    };
    let applied = run_pending_migrations(url)
        .await
        .wrap_err("failed to apply database migrations")?;
    info!(applied, "database migrations complete");
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_pool_size()))
        .await
        .wrap_err("failed to build database pool")?;
    Ok(Persistence::Database(pool))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load configuration")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .wrap_err("invalid session configuration")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let bind_addr: SocketAddr = settings
        .bind_addr()
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}", settings.bind_addr()))?;

    let persistence = connect(&settings).await?;
    if let Some(path) = &settings.seed_file {
        seed_accounts(path, &persistence)
            .await
            .wrap_err("failed to seed accounts")?;
    }

    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_persistence(persistence)
    .with_upload_dir(settings.upload_dir())
    .with_max_upload_bytes(settings.max_upload_bytes());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await?;
    Ok(())
}
