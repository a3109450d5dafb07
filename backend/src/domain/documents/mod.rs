//! Document tracking domain types.
//!
//! Documents move through a fixed status workflow (see
//! [`crate::domain::workflow`]). Each carries at most one initial and one
//! return attachment in the normal flow.

mod attachment;
mod document;
mod stats;
mod status;

pub use attachment::{
    Attachment, AttachmentKind, FILE_NAME_MAX, FilePart, UnknownAttachmentKindError,
    UploadValidationError, UploadedFile,
};
pub use document::{
    Document, DocumentDetails, DocumentId, DocumentTitle, DocumentTitleError, TITLE_MAX,
};
pub use stats::DocumentStats;
pub use status::{DocumentStatus, UnknownStatusError};

use crate::domain::UserId;

/// Which documents a query may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentScope {
    /// Every document (administrators).
    All,
    /// Only documents assigned to this consultant.
    AssignedTo(UserId),
}

impl DocumentScope {
    /// Whether a document assigned to `consultant_id` falls inside the scope.
    pub fn includes(&self, consultant_id: &UserId) -> bool {
        match self {
            Self::All => true,
            Self::AssignedTo(owner) => owner == consultant_id,
        }
    }
}
