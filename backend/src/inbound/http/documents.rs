//! Document workflow HTTP handlers.
//!
//! ```text
//! GET /api/documents
//! GET /api/documents/{id}
//! POST /api/documents              (multipart: title, consultantId, file)
//! PATCH /api/documents/{id}/status {"status":"RECEIPT_CONFIRMED"}
//! POST /api/documents/{id}/return  (multipart: file)
//! DELETE /api/documents/{id}
//! GET /api/stats
//! ```
//!
//! Handlers only translate between HTTP and the document ports; every role
//! and state check happens in the domain.

use actix_multipart::MultipartError;
use actix_multipart::form::{MultipartForm, MultipartFormConfig};
use actix_web::error::PayloadError;
use actix_web::{HttpResponse, delete, get, patch, post, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_document_id, parse_status};

pub use super::documents_dto::{
    AttachmentResponse, DocumentResponse, NewDocumentForm, NewDocumentUpload, ReturnForm,
    ReturnUpload, StatsResponse, StatusRequest,
};
use super::documents_dto::DocumentPath;

/// Room left in a multipart body for the text fields and part headers.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Multipart limits for document uploads.
///
/// The form may carry a little more than `max_upload_bytes` so the domain
/// reports the precise limit; anything larger fails while streaming with
/// `413 Payload Too Large`.
pub fn multipart_config(max_upload_bytes: usize) -> MultipartFormConfig {
    let limit = max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    MultipartFormConfig::default()
        .memory_limit(limit)
        .total_limit(limit)
        .error_handler(|err, _req| map_multipart_error(&err).into())
}

fn map_multipart_error(err: &MultipartError) -> Error {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => {
            Error::payload_too_large("uploaded file exceeds the size limit")
        }
        other => Error::invalid_request(format!("malformed multipart body: {other}")),
    }
}

/// List documents visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "Visible documents", body = [DocumentResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "listDocuments"
)]
#[get("/documents")]
pub async fn list_documents(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<DocumentResponse>>> {
    let documents = state.documents_query.list_documents(&auth.caller()).await?;
    Ok(web::Json(
        documents.into_iter().map(DocumentResponse::from).collect(),
    ))
}

/// Fetch one document.
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "getDocument"
)]
#[get("/documents/{id}")]
pub async fn get_document(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<DocumentPath>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let id = parse_document_id(&path.id)?;
    let details = state
        .documents_query
        .get_document(&auth.caller(), &id)
        .await?;
    Ok(web::Json(DocumentResponse::from(details)))
}

/// Deliver a new document to a consultant.
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body(content = NewDocumentUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Consultant not found", body = ErrorSchema),
        (status = 413, description = "File too large", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "createDocument"
)]
#[post("/documents")]
pub async fn create_document(
    state: web::Data<HttpState>,
    auth: Authenticated,
    form: MultipartForm<NewDocumentForm>,
) -> ApiResult<HttpResponse> {
    let request = form.into_inner().into_request();
    let details = state
        .documents
        .create_document(&auth.caller(), request)
        .await?;
    Ok(HttpResponse::Created().json(DocumentResponse::from(details)))
}

/// Move a document to the requested status.
///
/// Accepts `RECEIPT_CONFIRMED`, `COMPLETED` and `ARCHIVED`. Returns go
/// through `POST /api/documents/{id}/return`.
#[utoipa::path(
    patch,
    path = "/api/documents/{id}/status",
    request_body = StatusRequest,
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "changeDocumentStatus"
)]
#[patch("/documents/{id}/status")]
pub async fn change_status(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<DocumentPath>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let id = parse_document_id(&path.id)?;
    let status = parse_status(payload.into_inner().status)?;
    let details = state
        .documents
        .change_status(&auth.caller(), &id, status)
        .await?;
    Ok(web::Json(DocumentResponse::from(details)))
}

/// Submit the consultant's return file.
#[utoipa::path(
    post,
    path = "/api/documents/{id}/return",
    request_body(content = ReturnUpload, content_type = "multipart/form-data"),
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 413, description = "File too large", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "submitReturn"
)]
#[post("/documents/{id}/return")]
pub async fn submit_return(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<DocumentPath>,
    form: MultipartForm<ReturnForm>,
) -> ApiResult<web::Json<DocumentResponse>> {
    let id = parse_document_id(&path.id)?;
    let file = form.into_inner().into_file();
    let details = state
        .documents
        .submit_return(&auth.caller(), &id, file)
        .await?;
    Ok(web::Json(DocumentResponse::from(details)))
}

/// Delete a document and its files.
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "deleteDocument"
)]
#[delete("/documents/{id}")]
pub async fn delete_document(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<DocumentPath>,
) -> ApiResult<HttpResponse> {
    let id = parse_document_id(&path.id)?;
    state
        .documents
        .delete_document(&auth.caller(), &id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Per-status counts over the caller's visible documents.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Document counts", body = StatsResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["documents"],
    operation_id = "documentStats"
)]
#[get("/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<StatsResponse>> {
    let stats = state.documents_query.stats(&auth.caller()).await?;
    Ok(web::Json(StatsResponse::from(stats)))
}

#[cfg(test)]
#[path = "documents_tests.rs"]
mod tests;
