//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`BlobStore`], [`PasswordHasher`]) are
//! implemented by outbound adapters. Driving ports ([`LoginService`],
//! [`UsersQuery`], [`DocumentCommand`], [`DocumentQuery`]) are what inbound
//! adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod blob_store;
mod document_command;
mod document_query;
mod document_repository;
mod login_service;
mod password_hasher;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{BlobStore, BlobStoreError, StoredBlob};
#[cfg(test)]
pub use document_command::MockDocumentCommand;
pub use document_command::{DocumentCommand, NewDocumentRequest};
#[cfg(test)]
pub use document_query::MockDocumentQuery;
pub use document_query::DocumentQuery;
#[cfg(test)]
pub use document_repository::MockDocumentRepository;
pub use document_repository::{DocumentRepository, DocumentRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
