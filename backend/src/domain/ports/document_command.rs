//! Driving port for document workflow mutations.
//!
//! Every operation takes the resolved [`Caller`] and reports guard failures
//! as `Forbidden` or `InvalidTransition` domain errors.

use async_trait::async_trait;

use crate::domain::{Caller, DocumentDetails, DocumentId, DocumentStatus, Error, FilePart};

/// Request to deliver a new document to a consultant.
#[derive(Debug, Clone)]
pub struct NewDocumentRequest {
    /// Raw title; validated by the service.
    pub title: String,
    /// Raw consultant identifier; validated by the service.
    pub consultant_id: String,
    /// Initial file, unvalidated. Absent when the client sent no file part.
    pub file: Option<FilePart>,
}

/// Driving port for document write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentCommand: Send + Sync {
    /// Create a document in `DELIVERED` with its initial attachment.
    async fn create_document(
        &self,
        caller: &Caller,
        request: NewDocumentRequest,
    ) -> Result<DocumentDetails, Error>;

    /// `DELIVERED -> RECEIPT_CONFIRMED`, by the assigned consultant.
    async fn confirm_receipt(
        &self,
        caller: &Caller,
        id: &DocumentId,
    ) -> Result<DocumentDetails, Error>;

    /// `RECEIPT_CONFIRMED -> RETURN_SENT`, by the assigned consultant, with
    /// the return file.
    async fn submit_return(
        &self,
        caller: &Caller,
        id: &DocumentId,
        file: Option<FilePart>,
    ) -> Result<DocumentDetails, Error>;

    /// `RETURN_SENT -> COMPLETED`, by an administrator.
    async fn confirm_return(
        &self,
        caller: &Caller,
        id: &DocumentId,
    ) -> Result<DocumentDetails, Error>;

    /// Archive a non-archived document, by an administrator.
    async fn archive(&self, caller: &Caller, id: &DocumentId) -> Result<DocumentDetails, Error>;

    /// Generic status update routed to the matching transition.
    async fn change_status(
        &self,
        caller: &Caller,
        id: &DocumentId,
        status: DocumentStatus,
    ) -> Result<DocumentDetails, Error>;

    /// Delete a document and its files, by an administrator.
    async fn delete_document(&self, caller: &Caller, id: &DocumentId) -> Result<(), Error>;
}
