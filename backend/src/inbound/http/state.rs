//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::DEFAULT_MAX_UPLOAD_BYTES;
use crate::domain::ports::{BlobStore, DocumentCommand, DocumentQuery, LoginService, UsersQuery};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Credential check.
    pub login: Arc<dyn LoginService>,
    /// User lookups.
    pub users: Arc<dyn UsersQuery>,
    /// Workflow mutations.
    pub documents: Arc<dyn DocumentCommand>,
    /// Workflow reads.
    pub documents_query: Arc<dyn DocumentQuery>,
    /// Stored attachment content.
    pub files: Arc<dyn BlobStore>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Credential check.
    pub login: Arc<dyn LoginService>,
    /// User lookups.
    pub users: Arc<dyn UsersQuery>,
    /// Workflow mutations.
    pub documents: Arc<dyn DocumentCommand>,
    /// Workflow reads.
    pub documents_query: Arc<dyn DocumentQuery>,
    /// Stored attachment content.
    pub files: Arc<dyn BlobStore>,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state with the default upload limit.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            users,
            documents,
            documents_query,
            files,
        } = ports;
        Self {
            login,
            users,
            documents,
            documents_query,
            files,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the upload limit enforced by multipart handlers.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
