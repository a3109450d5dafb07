//! Driving port for user-facing account queries.

use async_trait::async_trait;

use crate::domain::{Caller, Error, User, UserId};

/// Domain use-case port for reading accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Look up a single account, typically the session holder.
    ///
    /// Returns `Ok(None)` when the account no longer exists.
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// List consultant accounts ordered by display name.
    ///
    /// Administrator only.
    async fn list_consultants(&self, caller: &Caller) -> Result<Vec<User>, Error>;
}
