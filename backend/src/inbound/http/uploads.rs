//! Download of stored attachment content.
//!
//! ```text
//! GET /uploads/{key}
//! ```

use actix_web::http::header::{
    CACHE_CONTROL, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpResponse, get, web};
use tracing::debug;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::BlobStoreError;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Length of a hyphenated UUID key prefix.
const KEY_PREFIX_LEN: usize = 36;

/// Recover the uploaded file name from a `<uuid>-<name>` key.
fn file_name_from_key(key: &str) -> &str {
    let has_prefix = key
        .get(..KEY_PREFIX_LEN)
        .is_some_and(|prefix| Uuid::parse_str(prefix).is_ok());
    if has_prefix {
        key.get(KEY_PREFIX_LEN + 1..)
            .filter(|name| !name.is_empty())
            .unwrap_or(key)
    } else {
        key
    }
}

fn map_read_error(err: BlobStoreError) -> Error {
    match err {
        BlobStoreError::InvalidKey { key } | BlobStoreError::NotFound { key } => {
            debug!(%key, "requested upload is not available");
            Error::not_found("file not found")
        }
        BlobStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("file store unavailable: {message}"))
        }
        BlobStoreError::Io { message } => Error::internal(format!("file read failed: {message}")),
    }
}

/// Stream a stored attachment to a signed-in user.
#[utoipa::path(
    get,
    path = "/uploads/{key}",
    params(("key" = String, Path, description = "Key from an attachment's fileUrl")),
    responses(
        (status = 200, description = "File content", body = String, content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "downloadUpload"
)]
#[get("/uploads/{key}")]
pub async fn download(
    state: web::Data<HttpState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let bytes = state.files.read(&key).await.map_err(map_read_error)?;
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(
            file_name_from_key(&key).to_owned(),
        )],
    };
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(disposition)
        .insert_header((CACHE_CONTROL, "private, no-store"))
        .body(bytes))
}
