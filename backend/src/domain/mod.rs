//! Domain primitives, workflow rules and services.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers, the document status workflow, and the services that implement
//! the driving ports. Types keep their invariants in their constructors and
//! document serialisation contracts in their Rustdoc.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: API error payload and stable identifiers.
//! - [`User`], [`UserId`], [`Role`]: account identity.
//! - [`Document`], [`DocumentStatus`], [`Attachment`]: tracked documents.
//! - [`workflow`]: the transition guard.
//! - [`DocumentService`], [`AccountService`], [`AccountSeeder`]: services.

mod account_seeding;
mod account_service;
pub mod auth;
mod document_service;
pub mod documents;
pub mod error;
pub mod ports;
mod service_support;
pub mod trace_id;
pub mod user;
pub mod workflow;

pub use self::account_seeding::{AccountRegistry, AccountSeed, AccountSeeder, AccountSeedingError};
pub use self::account_service::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::document_service::{DEFAULT_MAX_UPLOAD_BYTES, DocumentService};
pub use self::documents::{
    Attachment, AttachmentKind, Document, DocumentDetails, DocumentId, DocumentScope,
    DocumentStats, DocumentStatus, DocumentTitle, DocumentTitleError, FILE_NAME_MAX, FilePart,
    TITLE_MAX,
    UnknownAttachmentKindError, UnknownStatusError, UploadValidationError, UploadedFile,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, Role, USER_ID_MAX, User, UserId, UserValidationError,
};
pub use self::workflow::{Caller, GuardRejection, Transition};

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use doctrack::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
