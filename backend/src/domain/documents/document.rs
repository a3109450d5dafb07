//! Document aggregate and read model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Attachment, AttachmentKind, DocumentStatus};
use crate::domain::{User, UserId};

/// Stable document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Maximum accepted title length.
pub const TITLE_MAX: usize = 200;

/// Validation failures for document titles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentTitleError {
    /// The title was blank.
    #[error("title must not be empty")]
    Empty,
    /// The title exceeded [`TITLE_MAX`] characters.
    #[error("title must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Trimmed, non-empty document title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTitle(String);

impl DocumentTitle {
    /// Validate and construct a title.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DocumentTitleError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DocumentTitleError::Empty);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(DocumentTitleError::TooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DocumentTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked document assigned to one consultant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Title given by the administrator.
    pub title: DocumentTitle,
    /// Consultant the document is assigned to.
    pub consultant_id: UserId,
    /// Current workflow status.
    pub status: DocumentStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest status change.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Build a freshly delivered document.
    pub fn delivered(
        id: DocumentId,
        title: DocumentTitle,
        consultant_id: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            consultant_id,
            status: DocumentStatus::Delivered,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Document joined with its consultant and attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDetails {
    /// The document itself.
    pub document: Document,
    /// Assigned consultant.
    pub consultant: User,
    /// Attachments ordered by creation time.
    pub attachments: Vec<Attachment>,
}

impl DocumentDetails {
    /// Attachments of the given kind.
    pub fn attachments_of(&self, kind: AttachmentKind) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(move |a| a.kind == kind)
    }
}
