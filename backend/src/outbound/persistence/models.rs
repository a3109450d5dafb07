//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; repositories convert them into
//! validated domain types and report malformed rows as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Attachment, AttachmentKind, Document, DocumentId, DocumentStatus, DocumentTitle, Role, User,
    UserId,
};

use super::schema::{attachments, documents, users};

/// Public account columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, String> {
        let role = self.role.parse::<Role>().map_err(|err| err.to_string())?;
        User::try_from_strings(self.id, self.display_name, role).map_err(|err| err.to_string())
    }
}

/// Account columns plus the stored hash.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CredentialsRow {
    #[diesel(embed)]
    pub user: UserRow,
    pub password_hash: String,
}

/// Insert or refresh an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: &'a str,
    pub display_name: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

/// Document columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub title: String,
    pub consultant_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    pub(crate) fn into_document(self) -> Result<Document, String> {
        Ok(Document {
            id: DocumentId::from(self.id),
            title: DocumentTitle::new(self.title).map_err(|err| err.to_string())?,
            consultant_id: UserId::new(self.consultant_id).map_err(|err| err.to_string())?,
            status: self.status.parse::<DocumentStatus>().map_err(|err| err.to_string())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = documents)]
pub(crate) struct NewDocumentRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub consultant_id: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Document> for NewDocumentRow<'a> {
    fn from(document: &'a Document) -> Self {
        Self {
            id: *document.id.as_uuid(),
            title: document.title.as_ref(),
            consultant_id: document.consultant_id.as_ref(),
            status: document.status.as_str(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// Attachment columns.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttachmentRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub kind: String,
    pub file_name: String,
    pub store_key: String,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRow {
    pub(crate) fn into_attachment(self) -> Result<Attachment, String> {
        Ok(Attachment {
            id: self.id,
            document_id: DocumentId::from(self.document_id),
            kind: self.kind.parse::<AttachmentKind>().map_err(|err| err.to_string())?,
            file_name: self.file_name,
            store_key: self.store_key,
            url: self.file_url,
            created_at: self.created_at,
        })
    }
}

impl From<&Attachment> for AttachmentRow {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id,
            document_id: *attachment.document_id.as_uuid(),
            kind: attachment.kind.as_str().to_owned(),
            file_name: attachment.file_name.clone(),
            store_key: attachment.store_key.clone(),
            file_url: attachment.url.clone(),
            created_at: attachment.created_at,
        }
    }
}
