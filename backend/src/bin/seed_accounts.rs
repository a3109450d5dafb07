//! Apply an account registry to the PostgreSQL database.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use doctrack::outbound::password::Argon2PasswordHasher;
use doctrack::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use doctrack::startup::seed_accounts_from_file;
use tokio::runtime::Builder;

const DATABASE_URL_ENV: &str = "DOCTRACK_DATABASE_URL";

/// `seed-accounts` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seed-accounts",
    about = "Create or update accounts from a JSON registry",
    version
)]
struct CliArgs {
    /// Path to the account registry.
    #[arg(long = "registry", value_name = "path")]
    registry: PathBuf,
    /// Database connection URL. Falls back to `DOCTRACK_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url, env::var(DATABASE_URL_ENV).ok())?;

    run_pending_migrations(&database_url)
        .await
        .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let seeded = seed_accounts_from_file(
        &args.registry,
        Arc::new(DieselUserRepository::new(pool)),
        Arc::new(Argon2PasswordHasher::new()),
    )
    .await
    .map_err(io::Error::other)?;
    println!("registry={}", args.registry.display());
    println!("seeded_accounts={seeded}");
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    let missing = || {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("database URL missing: set --database-url or {DATABASE_URL_ENV}"),
        )
    };
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    from_env.filter(|value| !value.trim().is_empty()).ok_or_else(missing)
}
