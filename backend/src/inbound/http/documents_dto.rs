//! Document DTOs and multipart forms.

use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::NewDocumentRequest;
use crate::domain::{Attachment, DocumentDetails, DocumentStats, FilePart, User};
use crate::inbound::http::schemas::UserSchema;

#[derive(Debug, Deserialize)]
pub(super) struct DocumentPath {
    pub(super) id: String,
}

/// Multipart body for `POST /api/documents`.
#[derive(MultipartForm)]
pub struct NewDocumentForm {
    pub title: Option<Text<String>>,
    #[multipart(rename = "consultantId")]
    pub consultant_id: Option<Text<String>>,
    pub file: Option<Bytes>,
}

impl NewDocumentForm {
    /// Convert the form into a domain request.
    ///
    /// Missing text fields become empty strings and the file travels
    /// unvalidated, so the service reports every field with its own codes.
    pub(super) fn into_request(self) -> NewDocumentRequest {
        NewDocumentRequest {
            title: self.title.map(Text::into_inner).unwrap_or_default(),
            consultant_id: self.consultant_id.map(Text::into_inner).unwrap_or_default(),
            file: self.file.map(file_part),
        }
    }
}

/// Multipart body for `POST /api/documents/{id}/return`.
#[derive(MultipartForm)]
pub struct ReturnForm {
    pub file: Option<Bytes>,
}

impl ReturnForm {
    pub(super) fn into_file(self) -> Option<FilePart> {
        self.file.map(file_part)
    }
}

fn file_part(part: Bytes) -> FilePart {
    FilePart {
        file_name: part.file_name,
        bytes: part.data.to_vec(),
    }
}

/// OpenAPI shape of [`NewDocumentForm`].
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct NewDocumentUpload {
    /// Document title.
    #[schema(example = "Contrato de prestação de serviços")]
    title: String,
    /// Consultant the document is assigned to.
    #[schema(rename = "consultantId", example = "mayco.muniz")]
    consultant_id: String,
    /// Initial file.
    #[schema(value_type = String)]
    file: Vec<u8>,
}

/// OpenAPI shape of [`ReturnForm`].
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReturnUpload {
    /// Return file.
    #[schema(value_type = String)]
    file: Vec<u8>,
}

/// Request payload for `PATCH /api/documents/{id}/status`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    /// Requested target status.
    #[schema(example = "RECEIPT_CONFIRMED")]
    pub status: Option<String>,
}

/// Response payload for an attachment.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub document_id: String,
    #[schema(example = "INITIAL")]
    pub attachment_type: String,
    pub file_name: String,
    #[schema(example = "/uploads/0b7c2a9e-contract.pdf")]
    pub file_url: String,
    pub created_at: String,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id.to_string(),
            document_id: attachment.document_id.to_string(),
            attachment_type: attachment.kind.as_str().to_owned(),
            file_name: attachment.file_name,
            file_url: attachment.url,
            created_at: attachment.created_at.to_rfc3339(),
        }
    }
}

/// Response payload for a document with its consultant and attachments.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    #[schema(example = "DELIVERED")]
    pub status: String,
    pub consultant_id: String,
    #[schema(value_type = UserSchema)]
    pub consultant: User,
    pub attachments: Vec<AttachmentResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DocumentDetails> for DocumentResponse {
    fn from(details: DocumentDetails) -> Self {
        let DocumentDetails {
            document,
            consultant,
            attachments,
        } = details;
        Self {
            id: document.id.to_string(),
            title: document.title.to_string(),
            status: document.status.as_str().to_owned(),
            consultant_id: document.consultant_id.to_string(),
            consultant,
            attachments: attachments.into_iter().map(AttachmentResponse::from).collect(),
            created_at: document.created_at.to_rfc3339(),
            updated_at: document.updated_at.to_rfc3339(),
        }
    }
}

/// Per-status document counts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub delivered: u64,
    pub receipt_confirmed: u64,
    pub return_sent: u64,
    pub completed: u64,
    pub archived: u64,
    pub total: u64,
}

impl From<DocumentStats> for StatsResponse {
    fn from(stats: DocumentStats) -> Self {
        Self {
            delivered: stats.delivered,
            receipt_confirmed: stats.receipt_confirmed,
            return_sent: stats.return_sent,
            completed: stats.completed,
            archived: stats.archived,
            total: stats.total,
        }
    }
}
