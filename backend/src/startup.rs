//! Account seeding at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;
use tracing::info;

use crate::domain::ports::{PasswordHasher, UserRepository};
use crate::domain::{AccountRegistry, AccountSeeder, AccountSeedingError};
use crate::outbound::password::Argon2PasswordHasher;
use crate::outbound::persistence::DieselUserRepository;
use crate::server::Persistence;

/// Errors returned while seeding accounts from a registry file.
#[derive(Debug, Error)]
pub enum StartupSeedingError {
    /// The registry file could not be read.
    #[error("failed to read account registry at {path}: {source}")]
    RegistryRead {
        /// Registry path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The registry is not valid JSON of the expected shape.
    #[error("account registry at {path} is malformed: {source}")]
    RegistryParse {
        /// Registry path.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Validation, hashing or persistence failed.
    #[error(transparent)]
    Seeding(#[from] AccountSeedingError),
}

/// Seed the registry at `path` into whichever backend the server will use.
///
/// # Errors
///
/// See [`seed_accounts_from_file`].
pub async fn seed_accounts(
    path: &Path,
    persistence: &Persistence,
) -> Result<usize, StartupSeedingError> {
    let hasher = Arc::new(Argon2PasswordHasher::new());
    match persistence {
        Persistence::Database(pool) => {
            let users = Arc::new(DieselUserRepository::new(pool.clone()));
            seed_accounts_from_file(path, users, hasher).await
        }
        Persistence::Memory { users, .. } => {
            seed_accounts_from_file(path, Arc::clone(users), hasher).await
        }
    }
}

/// Read the registry at `path` and seed every account in it.
///
/// Returns the number of accounts written.
///
/// # Errors
///
/// Returns [`StartupSeedingError`] when the file cannot be read or parsed,
/// or when seeding fails. Nothing is written if any entry is invalid.
pub async fn seed_accounts_from_file<U, H>(
    path: &Path,
    users: Arc<U>,
    hasher: Arc<H>,
) -> Result<usize, StartupSeedingError>
where
    U: UserRepository,
    H: PasswordHasher,
{
    let registry = load_registry(path)?;
    let seeded = AccountSeeder::new(users, hasher).seed(&registry).await?;
    info!(path = %path.display(), seeded, "account registry applied");
    Ok(seeded)
}

/// Read and parse an account registry through a capability handle on its
/// parent directory.
///
/// # Errors
///
/// Returns [`StartupSeedingError::RegistryRead`] or
/// [`StartupSeedingError::RegistryParse`].
pub fn load_registry(path: &Path) -> Result<AccountRegistry, StartupSeedingError> {
    let read_error = |source| StartupSeedingError::RegistryRead {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "registry path must name a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(file_name).map_err(read_error)?;
    AccountRegistry::from_json(&contents).map_err(|source| StartupSeedingError::RegistryParse {
        path: path.to_path_buf(),
        source,
    })
}
