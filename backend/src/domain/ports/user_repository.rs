//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

/// A user together with the stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// The account.
    pub user: User,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

/// Port for reading and seeding user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and its password hash for login.
    async fn find_credentials(
        &self,
        id: &UserId,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// List users holding `role`, ordered by display name.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError>;

    /// Insert or update a user and its password hash.
    async fn upsert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError>;
}
