//! Document tracking backend.
//!
//! Administrators assign documents to consultants, consultants confirm
//! receipt and upload a return, and administrators close the loop. The
//! crate is laid out hexagonally: [`domain`] holds the workflow and its
//! ports, [`inbound`] the HTTP adapter, [`outbound`] the PostgreSQL,
//! in-memory, filesystem and password adapters, and [`server`] wires them
//! together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
pub mod startup;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
