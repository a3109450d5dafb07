//! Builders wiring repositories and services into HTTP state.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    BlobStore, BlobStoreError, DocumentCommand, DocumentQuery, DocumentRepository, LoginService,
    UserRepository, UsersQuery,
};
use crate::domain::{AccountService, DocumentService};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{MemoryDocumentRepository, MemoryUserRepository};
use crate::outbound::password::Argon2PasswordHasher;
use crate::outbound::persistence::{DbPool, DieselDocumentRepository, DieselUserRepository};
use crate::outbound::storage::LocalBlobStore;

use super::ServerConfig;

/// Repository backend selected at startup.
#[derive(Clone)]
pub enum Persistence {
    /// PostgreSQL through the shared connection pool.
    Database(DbPool),
    /// Process-local storage, lost on restart.
    Memory {
        /// Accounts.
        users: Arc<MemoryUserRepository>,
        /// Documents, joined against `users`.
        documents: Arc<MemoryDocumentRepository>,
    },
}

impl Persistence {
    /// Fresh, empty in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let documents = Arc::new(MemoryDocumentRepository::new(Arc::clone(&users)));
        Self::Memory { users, documents }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "postgres",
            Self::Memory { .. } => "memory",
        }
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Assemble the account and document services over one repository pair.
fn service_ports<D, U, B>(
    documents: Arc<D>,
    users: Arc<U>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
    max_upload_bytes: usize,
) -> HttpStatePorts
where
    D: DocumentRepository + 'static,
    U: UserRepository + 'static,
    B: BlobStore + 'static,
{
    let accounts = Arc::new(AccountService::new(
        Arc::clone(&users),
        Arc::new(Argon2PasswordHasher::new()),
    ));
    let workflow = Arc::new(
        DocumentService::new(documents, users, Arc::clone(&blobs), clock)
            .with_max_upload_bytes(max_upload_bytes),
    );
    HttpStatePorts {
        login: Arc::clone(&accounts) as Arc<dyn LoginService>,
        users: accounts as Arc<dyn UsersQuery>,
        documents: Arc::clone(&workflow) as Arc<dyn DocumentCommand>,
        documents_query: workflow as Arc<dyn DocumentQuery>,
        files: blobs as Arc<dyn BlobStore>,
    }
}

/// Build handler state from the server configuration.
///
/// # Errors
///
/// Returns [`BlobStoreError`] when the upload directory cannot be created
/// or opened.
pub fn build_http_state(config: &ServerConfig) -> Result<HttpState, BlobStoreError> {
    let blobs = Arc::new(LocalBlobStore::open(&config.upload_dir)?);
    let clock = Arc::clone(&config.clock);
    let ports = match &config.persistence {
        Persistence::Database(pool) => service_ports(
            Arc::new(DieselDocumentRepository::new(pool.clone())),
            Arc::new(DieselUserRepository::new(pool.clone())),
            blobs,
            clock,
            config.max_upload_bytes,
        ),
        Persistence::Memory { users, documents } => service_ports(
            Arc::clone(documents),
            Arc::clone(users),
            blobs,
            clock,
            config.max_upload_bytes,
        ),
    };
    Ok(HttpState::new(ports).with_max_upload_bytes(config.max_upload_bytes))
}
