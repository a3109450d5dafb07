//! Files bound to a document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DocumentId;

/// Which leg of the workflow produced the attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentKind {
    /// File uploaded by the administrator when the document was created.
    Initial,
    /// File uploaded by the consultant when submitting the return.
    Return,
}

impl AttachmentKind {
    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Return => "RETURN",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored attachment kind is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attachment kind '{0}'")]
pub struct UnknownAttachmentKindError(pub String);

impl FromStr for AttachmentKind {
    type Err = UnknownAttachmentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIAL" => Ok(Self::Initial),
            "RETURN" => Ok(Self::Return),
            other => Err(UnknownAttachmentKindError(other.to_owned())),
        }
    }
}

/// A stored file reference bound to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment identifier.
    pub id: Uuid,
    /// Owning document.
    pub document_id: DocumentId,
    /// Workflow leg that produced the file.
    pub kind: AttachmentKind,
    /// File name as supplied by the uploader.
    pub file_name: String,
    /// Blob store key used to read or remove the bytes.
    pub store_key: String,
    /// Retrievable URL handed to clients.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Maximum accepted length of an uploaded file name.
pub const FILE_NAME_MAX: usize = 255;

/// Validation failures for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadValidationError {
    /// The multipart part carried no file name.
    #[error("file name must not be empty")]
    EmptyFileName,
    /// The file name exceeded [`FILE_NAME_MAX`] characters.
    #[error("file name must be at most {max} characters")]
    FileNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The file had no content.
    #[error("file must not be empty")]
    EmptyFile,
}

/// File received from a client, not yet stored.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Validate the file name and content.
    ///
    /// Only the final path component of `file_name` is kept so client-side
    /// directory names never reach storage.
    ///
    /// # Examples
    /// ```
    /// use doctrack::domain::UploadedFile;
    ///
    /// let file = UploadedFile::new("C:\\docs\\contract.pdf", b"%PDF".to_vec()).unwrap();
    /// assert_eq!(file.file_name(), "contract.pdf");
    /// ```
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, UploadValidationError> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() {
            return Err(UploadValidationError::EmptyFileName);
        }
        if base.chars().count() > FILE_NAME_MAX {
            return Err(UploadValidationError::FileNameTooLong { max: FILE_NAME_MAX });
        }
        if bytes.is_empty() {
            return Err(UploadValidationError::EmptyFile);
        }
        Ok(Self {
            file_name: base.to_owned(),
            bytes,
        })
    }

    /// Sanitised file name.
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Raw file content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// File part as received from a client, before any validation.
///
/// Services validate it with [`FilePart::validate`] only after the caller
/// has been authorised.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Client-supplied file name, if the part carried one.
    pub file_name: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Wrap a named part.
    pub fn named(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            bytes,
        }
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the part has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Validate into an [`UploadedFile`]. A missing name counts as empty.
    ///
    /// # Examples
    /// ```
    /// use doctrack::domain::{FilePart, UploadValidationError};
    ///
    /// let nameless = FilePart { file_name: None, bytes: b"%PDF".to_vec() };
    /// assert_eq!(nameless.validate(), Err(UploadValidationError::EmptyFileName));
    /// ```
    pub fn validate(self) -> Result<UploadedFile, UploadValidationError> {
        UploadedFile::new(self.file_name.as_deref().unwrap_or_default(), self.bytes)
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
