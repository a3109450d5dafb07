//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod documents;
mod documents_dto;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;
pub(crate) mod validation;

pub use error::ApiResult;
