//! In-memory [`DocumentRepository`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{DocumentRepository, DocumentRepositoryError};
use crate::domain::{
    Attachment, Document, DocumentDetails, DocumentId, DocumentScope, DocumentStatus, User,
};

use super::{MemoryUserRepository, lock};

#[derive(Debug, Clone)]
struct Entry {
    document: Document,
    attachments: Vec<Attachment>,
}

/// Documents kept in insertion order, joined with the user store on read.
#[derive(Debug)]
pub struct MemoryDocumentRepository {
    users: Arc<MemoryUserRepository>,
    entries: Mutex<Vec<Entry>>,
}

impl MemoryDocumentRepository {
    /// Create an empty store reading consultants from `users`.
    pub fn new(users: Arc<MemoryUserRepository>) -> Self {
        Self {
            users,
            entries: Mutex::new(Vec::new()),
        }
    }

    fn snapshot(
        &self,
        filter: impl Fn(&Document) -> bool,
    ) -> Result<Vec<Entry>, DocumentRepositoryError> {
        let entries = lock(&self.entries, DocumentRepositoryError::query)?;
        Ok(entries
            .iter()
            .filter(|entry| filter(&entry.document))
            .cloned()
            .collect())
    }

    fn consultant_of(
        &self,
        document: &Document,
    ) -> Result<Option<User>, DocumentRepositoryError> {
        self.users
            .lookup(&document.consultant_id)
            .map_err(|err| DocumentRepositoryError::query(err.to_string()))
    }

    fn has_consultant(&self, document: &Document) -> Result<bool, DocumentRepositoryError> {
        Ok(self.consultant_of(document)?.is_some())
    }

    fn details(&self, entry: Entry) -> Result<Option<DocumentDetails>, DocumentRepositoryError> {
        let consultant = self.consultant_of(&entry.document)?;
        // Mirrors the inner join: documents whose consultant vanished are hidden.
        Ok(consultant.map(|consultant| DocumentDetails {
            document: entry.document,
            consultant,
            attachments: entry.attachments,
        }))
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn find(&self, id: &DocumentId) -> Result<Option<Document>, DocumentRepositoryError> {
        let entries = lock(&self.entries, DocumentRepositoryError::query)?;
        Ok(entries
            .iter()
            .find(|entry| entry.document.id == *id)
            .map(|entry| entry.document.clone()))
    }

    async fn find_details(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentDetails>, DocumentRepositoryError> {
        let found = self.snapshot(|document| document.id == *id)?;
        match found.into_iter().next() {
            Some(entry) => self.details(entry),
            None => Ok(None),
        }
    }

    async fn list_details(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<DocumentDetails>, DocumentRepositoryError> {
        let mut entries = self.snapshot(|document| scope.includes(&document.consultant_id))?;
        entries.reverse();
        entries.sort_by(|a, b| b.document.created_at.cmp(&a.document.created_at));
        let mut details = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(found) = self.details(entry)? {
                details.push(found);
            }
        }
        Ok(details)
    }

    async fn create(
        &self,
        document: &Document,
        initial: &Attachment,
    ) -> Result<(), DocumentRepositoryError> {
        let mut entries = lock(&self.entries, DocumentRepositoryError::query)?;
        if entries.iter().any(|entry| entry.document.id == document.id) {
            return Err(DocumentRepositoryError::query("duplicate document id"));
        }
        entries.push(Entry {
            document: document.clone(),
            attachments: vec![initial.clone()],
        });
        Ok(())
    }

    async fn update_status(
        &self,
        id: &DocumentId,
        expected: DocumentStatus,
        new: DocumentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError> {
        let mut entries = lock(&self.entries, DocumentRepositoryError::query)?;
        let Some(entry) = entries
            .iter_mut()
            .find(|entry| entry.document.id == *id && entry.document.status == expected)
        else {
            return Ok(false);
        };
        entry.document.status = new;
        entry.document.updated_at = at;
        Ok(true)
    }

    async fn record_return(
        &self,
        id: &DocumentId,
        attachment: &Attachment,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError> {
        let mut entries = lock(&self.entries, DocumentRepositoryError::query)?;
        let Some(entry) = entries.iter_mut().find(|entry| {
            entry.document.id == *id && entry.document.status == DocumentStatus::ReceiptConfirmed
        }) else {
            return Ok(false);
        };
        entry.document.status = DocumentStatus::ReturnSent;
        entry.document.updated_at = at;
        entry.attachments.push(attachment.clone());
        Ok(true)
    }

    async fn delete(
        &self,
        id: &DocumentId,
    ) -> Result<Option<Vec<Attachment>>, DocumentRepositoryError> {
        let mut entries = lock(&self.entries, DocumentRepositoryError::query)?;
        let position = entries.iter().position(|entry| entry.document.id == *id);
        Ok(position.map(|index| entries.remove(index).attachments))
    }

    async fn status_counts(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<(DocumentStatus, u64)>, DocumentRepositoryError> {
        let mut visible = Vec::new();
        for entry in self.snapshot(|document| scope.includes(&document.consultant_id))? {
            if self.has_consultant(&entry.document)? {
                visible.push(entry.document.status);
            }
        }
        Ok(DocumentStatus::ALL
            .into_iter()
            .map(|status| {
                let count = visible.iter().filter(|seen| **seen == status).count();
                (status, u64::try_from(count).unwrap_or(u64::MAX))
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}
