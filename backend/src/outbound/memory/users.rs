//! In-memory [`UserRepository`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{Role, User, UserId};

use super::lock;

/// Accounts keyed by id.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    accounts: Mutex<BTreeMap<UserId, StoredCredentials>>,
}

impl MemoryUserRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn lookup(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let accounts = lock(&self.accounts, UserPersistenceError::query)?;
        Ok(accounts.get(id).map(|stored| stored.user.clone()))
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        self.lookup(id)
    }

    async fn find_credentials(
        &self,
        id: &UserId,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let accounts = lock(&self.accounts, UserPersistenceError::query)?;
        Ok(accounts.get(id).cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError> {
        let accounts = lock(&self.accounts, UserPersistenceError::query)?;
        let mut users: Vec<User> = accounts
            .values()
            .filter(|stored| stored.user.role() == role)
            .map(|stored| stored.user.clone())
            .collect();
        users.sort_by(|a, b| {
            a.name()
                .as_ref()
                .cmp(b.name().as_ref())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(users)
    }

    async fn upsert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError> {
        let mut accounts = lock(&self.accounts, UserPersistenceError::query)?;
        accounts.insert(
            user.id().clone(),
            StoredCredentials {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(())
    }
}
