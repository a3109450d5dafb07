//! In-memory adapters used when no database is configured.
//!
//! Each store keeps its state behind a single mutex, so the compare-and-set
//! and all-or-nothing guarantees of the SQL adapters hold here too. State is
//! lost on restart.

mod documents;
mod users;

pub use documents::MemoryDocumentRepository;
pub use users::MemoryUserRepository;

use std::sync::{Mutex, MutexGuard};

fn lock<'a, T, E>(
    mutex: &'a Mutex<T>,
    poisoned: impl FnOnce(&'static str) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex.lock().map_err(|_| poisoned("in-memory store lock poisoned"))
}
