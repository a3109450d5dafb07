//! Account seeding from a JSON registry.
//!
//! The registry is validated as a whole before anything is written, so a
//! single bad entry leaves the store untouched.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository};
use crate::domain::{Role, User, UserValidationError};

/// One account entry in the registry.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountSeed {
    /// Login name and user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// `ADMIN` or `CONSULTANT`.
    pub role: String,
    /// Plain-text initial password.
    pub password: Zeroizing<String>,
}

impl fmt::Debug for AccountSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSeed")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parsed account registry.
///
/// # Examples
/// ```
/// use doctrack::domain::AccountRegistry;
///
/// let registry = AccountRegistry::from_json(
///     r#"{"accounts":[{"id":"admin","name":"Admin","role":"ADMIN","password":"s3cret"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(registry.accounts.len(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountRegistry {
    /// Accounts to create or refresh.
    pub accounts: Vec<AccountSeed>,
}

impl AccountRegistry {
    /// Parse a registry document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// Errors raised while seeding accounts.
#[derive(Debug, Error)]
pub enum AccountSeedingError {
    /// An entry failed validation.
    #[error("account #{index} ({id}) is invalid: {source}")]
    InvalidAccount {
        /// Position in the registry.
        index: usize,
        /// Raw id as written in the registry.
        id: String,
        /// Validation failure.
        #[source]
        source: UserValidationError,
    },
    /// An entry has an empty password.
    #[error("account {id} has an empty password")]
    EmptyPassword {
        /// Offending account id.
        id: String,
    },
    /// The same id appears more than once.
    #[error("account {id} appears more than once")]
    DuplicateId {
        /// Repeated id.
        id: String,
    },
    /// Hashing a password failed.
    #[error(transparent)]
    Hash(#[from] PasswordHashError),
    /// Writing an account failed.
    #[error(transparent)]
    Persistence(#[from] UserPersistenceError),
}

/// Seeds accounts through the user repository.
pub struct AccountSeeder<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountSeeder<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    /// Create a seeder.
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }

    /// Validate every entry, then hash and upsert each account.
    ///
    /// Returns the number of accounts written.
    pub async fn seed(&self, registry: &AccountRegistry) -> Result<usize, AccountSeedingError> {
        let accounts = validate(registry)?;
        for (user, password) in &accounts {
            let hash = self.hasher.hash(password)?;
            self.users.upsert(user, &hash).await?;
            info!(user_id = %user.id(), role = %user.role(), "account seeded");
        }
        Ok(accounts.len())
    }
}

fn validate(
    registry: &AccountRegistry,
) -> Result<Vec<(User, &Zeroizing<String>)>, AccountSeedingError> {
    let mut seen = HashSet::new();
    registry
        .accounts
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let user = seed
                .role
                .parse::<Role>()
                .and_then(|role| User::try_from_strings(seed.id.as_str(), seed.name.as_str(), role))
                .map_err(|source| AccountSeedingError::InvalidAccount {
                    index,
                    id: seed.id.clone(),
                    source,
                })?;
            if seed.password.is_empty() {
                return Err(AccountSeedingError::EmptyPassword {
                    id: seed.id.clone(),
                });
            }
            if !seen.insert(user.id().clone()) {
                return Err(AccountSeedingError::DuplicateId {
                    id: seed.id.clone(),
                });
            }
            Ok((user, &seed.password))
        })
        .collect()
}
