//! Port for storing uploaded file content.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } => "blob store unavailable: {message}",
        /// The key is malformed or escapes the store.
        InvalidKey { key: String } => "invalid blob key: {key}",
        /// No blob is stored under the key.
        NotFound { key: String } => "blob not found: {key}",
        /// Reading or writing the blob failed.
        Io { message: String } => "blob store I/O failed: {message}",
    }
}

/// Location of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Opaque key for later reads and removal.
    pub key: String,
    /// URL clients use to fetch the content.
    pub url: String,
}

/// Port for persisting uploaded files outside the database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh key derived from `file_name`.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<StoredBlob, BlobStoreError>;

    /// Read back the content stored under `key`.
    async fn read(&self, key: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Remove the content stored under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), BlobStoreError>;
}
