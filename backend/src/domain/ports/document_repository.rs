//! Port abstraction for document persistence.
//!
//! Status changes are compare-and-set: adapters apply them only when the
//! stored status still equals the expected one and report whether a row
//! changed. Two callers racing on the same document therefore cannot both
//! succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Attachment, Document, DocumentDetails, DocumentId, DocumentScope, DocumentStatus,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by document repository adapters.
    pub enum DocumentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "document repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "document repository query failed: {message}",
    }
}

/// Port for storing documents and their attachments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch the bare document row.
    async fn find(&self, id: &DocumentId) -> Result<Option<Document>, DocumentRepositoryError>;

    /// Fetch a document with its consultant and attachments.
    async fn find_details(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentDetails>, DocumentRepositoryError>;

    /// List documents inside `scope`, newest first.
    async fn list_details(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<DocumentDetails>, DocumentRepositoryError>;

    /// Insert a document and its initial attachment atomically.
    async fn create(
        &self,
        document: &Document,
        initial: &Attachment,
    ) -> Result<(), DocumentRepositoryError>;

    /// Move the document from `expected` to `new`.
    ///
    /// Returns `false` when the document is missing or no longer in
    /// `expected`.
    async fn update_status(
        &self,
        id: &DocumentId,
        expected: DocumentStatus,
        new: DocumentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError>;

    /// Atomically move the document from `RECEIPT_CONFIRMED` to
    /// `RETURN_SENT` and record the return attachment.
    ///
    /// Returns `false`, leaving no attachment behind, when the status
    /// precondition does not hold.
    async fn record_return(
        &self,
        id: &DocumentId,
        attachment: &Attachment,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError>;

    /// Delete the document and its attachments.
    ///
    /// Returns the removed attachments, or `None` when the document did not
    /// exist.
    async fn delete(
        &self,
        id: &DocumentId,
    ) -> Result<Option<Vec<Attachment>>, DocumentRepositoryError>;

    /// Count documents inside `scope` per status. Absent statuses may be
    /// omitted.
    async fn status_counts(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<(DocumentStatus, u64)>, DocumentRepositoryError>;
}
