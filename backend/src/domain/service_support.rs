//! Internal helpers shared by the domain services.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::{BlobStoreError, DocumentRepositoryError, UserPersistenceError};

pub(crate) fn map_document_repository_error(error: DocumentRepositoryError) -> Error {
    match error {
        DocumentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("document repository unavailable: {message}"))
        }
        DocumentRepositoryError::Query { message } => {
            Error::internal(format!("document repository error: {message}"))
        }
    }
}

pub(crate) fn map_user_repository_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

pub(crate) fn map_blob_store_error(error: BlobStoreError) -> Error {
    match error {
        BlobStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("blob store unavailable: {message}"))
        }
        BlobStoreError::NotFound { key } => Error::not_found(format!("file {key} not found")),
        other => Error::internal(format!("blob store error: {other}")),
    }
}

/// Validation failure on a single request field.
pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}
