//! Application settings loaded via OrthoConfig.
//!
//! Values come from `--flags`, `DOCTRACK_*` environment variables or a
//! configuration file, in that order of precedence.

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_MAX_UPLOAD_BYTES;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_DB_POOL_SIZE: u32 = 10;

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DOCTRACK")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it, state lives in memory.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Directory holding uploaded files.
    pub upload_dir: Option<PathBuf>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Account registry applied at startup.
    pub seed_file: Option<PathBuf>,
}

impl AppSettings {
    /// Listen address, defaulting to all interfaces on port 8080.
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Database URL, treating a blank value as absent.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, at least one.
    #[must_use]
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE).max(1)
    }

    /// Upload directory, defaulting to `./uploads`.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        self.upload_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_UPLOAD_DIR))
    }

    /// Upload limit in bytes, defaulting to 10 MiB.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }
}
