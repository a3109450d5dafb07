//! Driving port for document reads.
//!
//! Administrators see every document; consultants only see the ones
//! assigned to them. A consultant asking for someone else's document gets
//! `Forbidden`.

use async_trait::async_trait;

use crate::domain::{Caller, DocumentDetails, DocumentId, DocumentStats, Error};

/// Driving port for document read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentQuery: Send + Sync {
    /// Documents visible to the caller, newest first.
    async fn list_documents(&self, caller: &Caller) -> Result<Vec<DocumentDetails>, Error>;

    /// One document with its consultant and attachments.
    async fn get_document(&self, caller: &Caller, id: &DocumentId)
    -> Result<DocumentDetails, Error>;

    /// Per-status counts over the documents visible to the caller.
    async fn stats(&self, caller: &Caller) -> Result<DocumentStats, Error>;
}
