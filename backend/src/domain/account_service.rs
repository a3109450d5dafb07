//! Account services: login and user lookups.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{LoginService, PasswordHasher, UserRepository, UsersQuery};
use crate::domain::service_support::map_user_repository_error;
use crate::domain::workflow::Caller;
use crate::domain::{Error, LoginCredentials, Role, User, UserId};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Account service implementing [`LoginService`] and [`UsersQuery`].
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountService<U, H> {
    /// Create the service from a user repository and a password hasher.
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl<U, H> LoginService for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        // Malformed usernames cannot exist, so they fail like unknown ones.
        let Ok(id) = UserId::new(credentials.username()) else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let Some(stored) = self
            .users
            .find_credentials(&id)
            .await
            .map_err(map_user_repository_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let verified = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(|err| {
                warn!(user_id = %id, error = %err, "stored password hash unusable");
                Error::internal(format!("password verification failed: {err}"))
            })?;
        if !verified {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %id, role = %stored.user.role(), "user logged in");
        Ok(stored.user)
    }
}

#[async_trait]
impl<U, H> UsersQuery for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)
    }

    async fn list_consultants(&self, caller: &Caller) -> Result<Vec<User>, Error> {
        caller.require_admin()?;
        self.users
            .list_by_role(Role::Consultant)
            .await
            .map_err(map_user_repository_error)
    }
}
