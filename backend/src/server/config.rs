//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use mockable::{Clock, DefaultClock};

use crate::domain::DEFAULT_MAX_UPLOAD_BYTES;
use crate::outbound::persistence::DbPool;

use super::state_builders::Persistence;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) persistence: Persistence,
    pub(crate) upload_dir: PathBuf,
    pub(crate) max_upload_bytes: usize,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Construct a configuration backed by in-memory repositories.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            persistence: Persistence::in_memory(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            clock: Arc::new(DefaultClock),
        }
    }

    /// Use PostgreSQL-backed repositories.
    #[must_use]
    pub fn with_db_pool(self, pool: DbPool) -> Self {
        self.with_persistence(Persistence::Database(pool))
    }

    /// Use an already constructed persistence backend, for example one that
    /// was seeded before the server started.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = persistence;
        self
    }

    /// Store uploads under `dir`.
    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Override the largest accepted upload.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Replace the wall clock used for document timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Return the persistence backend the server will use.
    #[must_use]
    pub const fn persistence(&self) -> &Persistence {
        &self.persistence
    }
}
