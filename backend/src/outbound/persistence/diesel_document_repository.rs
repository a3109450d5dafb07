//! PostgreSQL-backed [`DocumentRepository`].
//!
//! Status changes are a single conditional `UPDATE ... WHERE status =
//! expected`. Creation and return recording run in transactions so a
//! document never exists without its initial attachment and a return
//! attachment never exists without the matching status change.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{DocumentRepository, DocumentRepositoryError};
use crate::domain::{
    Attachment, Document, DocumentDetails, DocumentId, DocumentScope, DocumentStatus,
};

use super::error_mapping::{document_diesel_error, document_pool_error};
use super::models::{AttachmentRow, DocumentRow, NewDocumentRow, UserRow};
use super::pool::DbPool;
use super::schema::{attachments, documents, users};

/// Diesel-backed implementation of the document repository port.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: DbPool,
}

impl DieselDocumentRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn malformed(message: String) -> DocumentRepositoryError {
    DocumentRepositoryError::query(format!("malformed document row: {message}"))
}

async fn load_attachments(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Attachment>>, DocumentRepositoryError> {
    let rows: Vec<AttachmentRow> = attachments::table
        .filter(attachments::document_id.eq_any(ids))
        .order((attachments::created_at.asc(), attachments::id.asc()))
        .select(AttachmentRow::as_select())
        .load(conn)
        .await
        .map_err(document_diesel_error)?;
    let mut grouped: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
    for row in rows {
        let attachment = row.into_attachment().map_err(malformed)?;
        grouped
            .entry(*attachment.document_id.as_uuid())
            .or_default()
            .push(attachment);
    }
    Ok(grouped)
}

fn assemble(
    rows: Vec<(DocumentRow, UserRow)>,
    mut attachments: HashMap<Uuid, Vec<Attachment>>,
) -> Result<Vec<DocumentDetails>, DocumentRepositoryError> {
    rows.into_iter()
        .map(|(document, consultant)| {
            let attachments = attachments.remove(&document.id).unwrap_or_default();
            Ok(DocumentDetails {
                document: document.into_document().map_err(malformed)?,
                consultant: consultant.into_user().map_err(malformed)?,
                attachments,
            })
        })
        .collect()
}

#[async_trait]
impl DocumentRepository for DieselDocumentRepository {
    async fn find(&self, id: &DocumentId) -> Result<Option<Document>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let row = documents::table
            .find(id.as_uuid())
            .select(DocumentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(document_diesel_error)?;
        row.map(DocumentRow::into_document)
            .transpose()
            .map_err(malformed)
    }

    async fn find_details(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentDetails>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let rows: Vec<(DocumentRow, UserRow)> = documents::table
            .inner_join(users::table)
            .filter(documents::id.eq(id.as_uuid()))
            .select((DocumentRow::as_select(), UserRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(document_diesel_error)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let attachments = load_attachments(&mut conn, &[*id.as_uuid()]).await?;
        Ok(assemble(rows, attachments)?.into_iter().next())
    }

    async fn list_details(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<DocumentDetails>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let mut query = documents::table
            .inner_join(users::table)
            .select((DocumentRow::as_select(), UserRow::as_select()))
            .order((documents::created_at.desc(), documents::id.asc()))
            .into_boxed();
        if let DocumentScope::AssignedTo(consultant) = scope {
            query = query.filter(documents::consultant_id.eq(consultant.as_ref().to_owned()));
        }
        let rows: Vec<(DocumentRow, UserRow)> = query
            .load(&mut conn)
            .await
            .map_err(document_diesel_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|(document, _)| document.id).collect();
        let attachments = load_attachments(&mut conn, &ids).await?;
        assemble(rows, attachments)
    }

    async fn create(
        &self,
        document: &Document,
        initial: &Attachment,
    ) -> Result<(), DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let document_row = NewDocumentRow::from(document);
        let attachment_row = AttachmentRow::from(initial);
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(documents::table)
                    .values(&document_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(attachments::table)
                    .values(&attachment_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(document_diesel_error)
    }

    async fn update_status(
        &self,
        id: &DocumentId,
        expected: DocumentStatus,
        new: DocumentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let updated = diesel::update(
            documents::table
                .filter(documents::id.eq(id.as_uuid()))
                .filter(documents::status.eq(expected.as_str())),
        )
        .set((
            documents::status.eq(new.as_str()),
            documents::updated_at.eq(at),
        ))
        .execute(&mut conn)
        .await
        .map_err(document_diesel_error)?;
        Ok(updated > 0)
    }

    async fn record_return(
        &self,
        id: &DocumentId,
        attachment: &Attachment,
        at: DateTime<Utc>,
    ) -> Result<bool, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let attachment_row = AttachmentRow::from(attachment);
        let document_id = *id.as_uuid();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let updated = diesel::update(
                    documents::table
                        .filter(documents::id.eq(document_id))
                        .filter(documents::status.eq(DocumentStatus::ReceiptConfirmed.as_str())),
                )
                .set((
                    documents::status.eq(DocumentStatus::ReturnSent.as_str()),
                    documents::updated_at.eq(at),
                ))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Ok(false);
                }
                diesel::insert_into(attachments::table)
                    .values(&attachment_row)
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(document_diesel_error)
    }

    async fn delete(
        &self,
        id: &DocumentId,
    ) -> Result<Option<Vec<Attachment>>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let document_id = *id.as_uuid();
        let removed = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let rows: Vec<AttachmentRow> = attachments::table
                        .filter(attachments::document_id.eq(document_id))
                        .select(AttachmentRow::as_select())
                        .load(conn)
                        .await?;
                    let deleted = diesel::delete(documents::table.find(document_id))
                        .execute(conn)
                        .await?;
                    Ok((deleted > 0).then_some(rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(document_diesel_error)?;
        removed
            .map(|rows| {
                rows.into_iter()
                    .map(AttachmentRow::into_attachment)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(malformed)
            })
            .transpose()
    }

    async fn status_counts(
        &self,
        scope: &DocumentScope,
    ) -> Result<Vec<(DocumentStatus, u64)>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(document_pool_error)?;
        let rows: Vec<(String, i64)> = match scope {
            DocumentScope::All => {
                documents::table
                    .group_by(documents::status)
                    .select((documents::status, count_star()))
                    .load(&mut conn)
                    .await
            }
            DocumentScope::AssignedTo(consultant) => {
                documents::table
                    .filter(documents::consultant_id.eq(consultant.as_ref()))
                    .group_by(documents::status)
                    .select((documents::status, count_star()))
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(document_diesel_error)?;
        rows.into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<DocumentStatus>()
                    .map_err(|err| malformed(err.to_string()))?;
                let count = u64::try_from(count)
                    .map_err(|_| malformed(format!("negative count for {status}")))?;
                Ok((status, count))
            })
            .collect()
    }
}
