//! Document workflow service.
//!
//! Implements [`DocumentCommand`] and [`DocumentQuery`] over the document,
//! user and blob ports. Every status change goes through
//! [`workflow::guard`](crate::domain::workflow::guard) and is persisted with
//! a compare-and-set update; a lost race surfaces as `InvalidTransition`.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BlobStore, DocumentCommand, DocumentQuery, DocumentRepository, NewDocumentRequest,
    StoredBlob, UserRepository,
};
use crate::domain::service_support::{
    invalid_field, map_blob_store_error, map_document_repository_error,
    map_user_repository_error,
};
use crate::domain::workflow::{Caller, GuardRejection, Transition, guard};
use crate::domain::{
    Attachment, AttachmentKind, Document, DocumentDetails, DocumentId, DocumentScope,
    DocumentStats, DocumentStatus, DocumentTitle, DocumentTitleError, Error, FilePart, Role,
    UploadValidationError, UploadedFile, UserId,
};

/// Default upper bound for a single uploaded file.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Document service implementing the workflow driving ports.
#[derive(Clone)]
pub struct DocumentService<D, U, B> {
    documents: Arc<D>,
    users: Arc<U>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
    max_upload_bytes: usize,
}

impl<D, U, B> DocumentService<D, U, B> {
    /// Create a service with the default upload limit.
    pub fn new(documents: Arc<D>, users: Arc<U>, blobs: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            documents,
            users,
            blobs,
            clock,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the upload limit in bytes.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

fn scope_for(caller: &Caller) -> DocumentScope {
    if caller.is_admin() {
        DocumentScope::All
    } else {
        DocumentScope::AssignedTo(caller.user_id.clone())
    }
}

fn parse_title(raw: &str) -> Result<DocumentTitle, Error> {
    DocumentTitle::new(raw).map_err(|err| {
        let code = match err {
            DocumentTitleError::Empty => "empty_title",
            DocumentTitleError::TooLong { .. } => "title_too_long",
        };
        invalid_field("title", code, err.to_string())
    })
}

fn parse_consultant_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw.trim())
        .map_err(|err| invalid_field("consultantId", "invalid_consultant_id", err.to_string()))
}

impl<D, U, B> DocumentService<D, U, B>
where
    D: DocumentRepository,
    U: UserRepository,
    B: BlobStore,
{
    /// Validate an upload. Call only after the caller has been authorised.
    fn require_file(&self, file: Option<FilePart>) -> Result<UploadedFile, Error> {
        let file = file.ok_or_else(|| invalid_field("file", "missing_file", "a file is required"))?;
        if file.len() > self.max_upload_bytes {
            return Err(Error::payload_too_large(format!(
                "file exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }
        file.validate().map_err(|err| {
            let code = match err {
                UploadValidationError::EmptyFileName => "empty_file_name",
                UploadValidationError::FileNameTooLong { .. } => "file_name_too_long",
                UploadValidationError::EmptyFile => "empty_file",
            };
            invalid_field("file", code, err.to_string())
        })
    }

    async fn load(&self, id: &DocumentId) -> Result<Document, Error> {
        self.documents
            .find(id)
            .await
            .map_err(map_document_repository_error)?
            .ok_or_else(|| Error::not_found(format!("document {id} not found")))
    }

    async fn load_details(&self, id: &DocumentId) -> Result<DocumentDetails, Error> {
        self.documents
            .find_details(id)
            .await
            .map_err(map_document_repository_error)?
            .ok_or_else(|| Error::not_found(format!("document {id} not found")))
    }

    fn check(
        caller: &Caller,
        document: &Document,
        transition: Transition,
    ) -> Result<DocumentStatus, Error> {
        guard(caller, &document.consultant_id, document.status, transition).map_err(
            |rejection: GuardRejection| {
                debug!(
                    document_id = %document.id,
                    actor = %caller.user_id,
                    %transition,
                    %rejection,
                    "transition rejected"
                );
                Error::from(rejection)
            },
        )
    }

    /// Error for a compare-and-set that matched no row.
    async fn lost_race(&self, id: &DocumentId, transition: Transition) -> Error {
        match self.documents.find(id).await {
            Ok(Some(current)) => {
                debug!(
                    document_id = %id,
                    %transition,
                    current = %current.status,
                    "status changed concurrently"
                );
                GuardRejection::InvalidTransition {
                    transition,
                    current: current.status,
                }
                .into()
            }
            Ok(None) => Error::not_found(format!("document {id} not found")),
            Err(err) => map_document_repository_error(err),
        }
    }

    async fn discard_blob(&self, blob: &StoredBlob) {
        if let Err(err) = self.blobs.remove(&blob.key).await {
            warn!(key = %blob.key, error = %err, "failed to remove orphaned blob");
        }
    }

    fn attachment_for(
        &self,
        document_id: &DocumentId,
        kind: AttachmentKind,
        file: &UploadedFile,
        blob: StoredBlob,
    ) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            document_id: document_id.clone(),
            kind,
            file_name: file.file_name().to_owned(),
            store_key: blob.key,
            url: blob.url,
            created_at: self.clock.utc(),
        }
    }

    async fn transition(
        &self,
        caller: &Caller,
        id: &DocumentId,
        transition: Transition,
    ) -> Result<DocumentDetails, Error> {
        let document = self.load(id).await?;
        let next = Self::check(caller, &document, transition)?;

        let applied = self
            .documents
            .update_status(id, document.status, next, self.clock.utc())
            .await
            .map_err(map_document_repository_error)?;
        if !applied {
            return Err(self.lost_race(id, transition).await);
        }

        info!(
            document_id = %id,
            from = %document.status,
            to = %next,
            actor = %caller.user_id,
            "document status changed"
        );
        self.load_details(id).await
    }
}

#[async_trait]
impl<D, U, B> DocumentCommand for DocumentService<D, U, B>
where
    D: DocumentRepository,
    U: UserRepository,
    B: BlobStore,
{
    async fn create_document(
        &self,
        caller: &Caller,
        request: NewDocumentRequest,
    ) -> Result<DocumentDetails, Error> {
        caller.require_admin()?;
        let title = parse_title(&request.title)?;
        let consultant_id = parse_consultant_id(&request.consultant_id)?;
        let file = self.require_file(request.file)?;

        let consultant = self
            .users
            .find_by_id(&consultant_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found(format!("consultant {consultant_id} not found")))?;
        if consultant.role() != Role::Consultant {
            return Err(invalid_field(
                "consultantId",
                "not_a_consultant",
                format!("user {consultant_id} is not a consultant"),
            ));
        }

        let blob = self
            .blobs
            .store(file.file_name(), file.bytes())
            .await
            .map_err(map_blob_store_error)?;
        let stored = blob.clone();
        let document = Document::delivered(
            DocumentId::random(),
            title,
            consultant_id,
            self.clock.utc(),
        );
        let initial = self.attachment_for(&document.id, AttachmentKind::Initial, &file, blob);

        if let Err(err) = self.documents.create(&document, &initial).await {
            self.discard_blob(&stored).await;
            return Err(map_document_repository_error(err));
        }

        info!(
            document_id = %document.id,
            consultant = %document.consultant_id,
            actor = %caller.user_id,
            "document delivered"
        );
        Ok(DocumentDetails {
            document,
            consultant,
            attachments: vec![initial],
        })
    }

    async fn confirm_receipt(
        &self,
        caller: &Caller,
        id: &DocumentId,
    ) -> Result<DocumentDetails, Error> {
        self.transition(caller, id, Transition::ConfirmReceipt).await
    }

    async fn submit_return(
        &self,
        caller: &Caller,
        id: &DocumentId,
        file: Option<FilePart>,
    ) -> Result<DocumentDetails, Error> {
        let document = self.load(id).await?;
        let next = Self::check(caller, &document, Transition::SubmitReturn)?;
        let file = self.require_file(file)?;

        let blob = self
            .blobs
            .store(file.file_name(), file.bytes())
            .await
            .map_err(map_blob_store_error)?;
        let stored = blob.clone();
        let attachment = self.attachment_for(id, AttachmentKind::Return, &file, blob);

        let recorded = match self
            .documents
            .record_return(id, &attachment, self.clock.utc())
            .await
        {
            Ok(recorded) => recorded,
            Err(err) => {
                self.discard_blob(&stored).await;
                return Err(map_document_repository_error(err));
            }
        };
        if !recorded {
            self.discard_blob(&stored).await;
            return Err(self.lost_race(id, Transition::SubmitReturn).await);
        }

        info!(
            document_id = %id,
            from = %document.status,
            to = %next,
            actor = %caller.user_id,
            "document status changed"
        );
        self.load_details(id).await
    }

    async fn confirm_return(
        &self,
        caller: &Caller,
        id: &DocumentId,
    ) -> Result<DocumentDetails, Error> {
        self.transition(caller, id, Transition::ConfirmReturn).await
    }

    async fn archive(&self, caller: &Caller, id: &DocumentId) -> Result<DocumentDetails, Error> {
        self.transition(caller, id, Transition::Archive).await
    }

    async fn change_status(
        &self,
        caller: &Caller,
        id: &DocumentId,
        status: DocumentStatus,
    ) -> Result<DocumentDetails, Error> {
        match Transition::for_requested_status(status) {
            Some(transition) => self.transition(caller, id, transition).await,
            None => Err(Error::invalid_transition(format!(
                "status {status} cannot be requested directly"
            ))),
        }
    }

    async fn delete_document(&self, caller: &Caller, id: &DocumentId) -> Result<(), Error> {
        caller.require_admin()?;
        let removed = self
            .documents
            .delete(id)
            .await
            .map_err(map_document_repository_error)?
            .ok_or_else(|| Error::not_found(format!("document {id} not found")))?;

        for attachment in &removed {
            if let Err(err) = self.blobs.remove(&attachment.store_key).await {
                warn!(key = %attachment.store_key, error = %err, "failed to remove attachment blob");
            }
        }
        info!(document_id = %id, actor = %caller.user_id, "document deleted");
        Ok(())
    }
}

#[async_trait]
impl<D, U, B> DocumentQuery for DocumentService<D, U, B>
where
    D: DocumentRepository,
    U: UserRepository,
    B: BlobStore,
{
    async fn list_documents(&self, caller: &Caller) -> Result<Vec<DocumentDetails>, Error> {
        self.documents
            .list_details(&scope_for(caller))
            .await
            .map_err(map_document_repository_error)
    }

    async fn get_document(
        &self,
        caller: &Caller,
        id: &DocumentId,
    ) -> Result<DocumentDetails, Error> {
        let details = self.load_details(id).await?;
        if !scope_for(caller).includes(&details.document.consultant_id) {
            return Err(GuardRejection::Forbidden.into());
        }
        Ok(details)
    }

    async fn stats(&self, caller: &Caller) -> Result<DocumentStats, Error> {
        let counts = self
            .documents
            .status_counts(&scope_for(caller))
            .await
            .map_err(map_document_repository_error)?;
        Ok(DocumentStats::from_counts(counts))
    }
}

#[cfg(test)]
#[path = "document_service_tests.rs"]
mod tests;
