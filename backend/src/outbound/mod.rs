//! Outbound adapters implementing the driven ports.
//!
//! - [`persistence`]: PostgreSQL repositories using Diesel.
//! - [`memory`]: mutex-backed repositories for database-less runs and tests.
//! - [`storage`]: local directory blob store for uploaded files.
//! - [`password`]: Argon2id password hashing.
//!
//! Adapters translate between domain types and infrastructure
//! representations and contain no workflow logic.

pub mod memory;
pub mod password;
pub mod persistence;
pub mod storage;
