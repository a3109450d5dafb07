//! Shared Diesel error mapping for the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{DocumentRepositoryError, UserPersistenceError};

use super::pool::PoolError;

/// Translate a Diesel failure into a port error via its constructors.
///
/// Closed connections become connection errors; everything else is a query
/// error. Database detail is logged at debug and kept out of the message.
pub(super) fn map_diesel_error<E>(
    error: &DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        _ => query("database error"),
    }
}

pub(super) fn user_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

pub(super) fn user_diesel_error(error: DieselError) -> UserPersistenceError {
    map_diesel_error(
        &error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

pub(super) fn document_pool_error(error: PoolError) -> DocumentRepositoryError {
    DocumentRepositoryError::connection(error.into_message())
}

pub(super) fn document_diesel_error(error: DieselError) -> DocumentRepositoryError {
    map_diesel_error(
        &error,
        DocumentRepositoryError::query,
        DocumentRepositoryError::connection,
    )
}
