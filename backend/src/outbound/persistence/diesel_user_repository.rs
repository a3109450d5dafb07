//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{Role, User, UserId};

use super::error_mapping::{user_diesel_error, user_pool_error};
use super::models::{CredentialsRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn malformed(message: String) -> UserPersistenceError {
    UserPersistenceError::query(format!("malformed user row: {message}"))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .find(id.as_ref())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(UserRow::into_user).transpose().map_err(malformed)
    }

    async fn find_credentials(
        &self,
        id: &UserId,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = users::table
            .find(id.as_ref())
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_diesel_error)?;
        row.map(|CredentialsRow { user, password_hash }| {
            user.into_user().map(|user| StoredCredentials {
                user,
                password_hash,
            })
        })
        .transpose()
        .map_err(malformed)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(role.as_str()))
            .order((users::display_name.asc(), users::id.asc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(user_diesel_error)?;
        rows.into_iter()
            .map(UserRow::into_user)
            .collect::<Result<_, _>>()
            .map_err(malformed)
    }

    async fn upsert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(user_pool_error)?;
        let row = NewUserRow {
            id: user.id().as_ref(),
            display_name: user.name().as_ref(),
            password_hash,
            role: user.role().as_str(),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::display_name.eq(excluded(users::display_name)),
                users::password_hash.eq(excluded(users::password_hash)),
                users::role.eq(excluded(users::role)),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(user_diesel_error)?;
        Ok(())
    }
}
