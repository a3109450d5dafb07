//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint from the inbound layer together
//! with the schema wrappers that describe domain types without coupling them
//! to utoipa. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` exports it for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::documents::{
    AttachmentResponse, DocumentResponse, NewDocumentUpload, ReturnUpload, StatsResponse,
    StatusRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema, RoleSchema, UserSchema};
use crate::inbound::http::users::{LoginRequest, LoginResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Document tracking API",
        description = "Deliver documents to consultants, collect their returns and follow each document through its workflow."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::list_consultants,
        crate::inbound::http::documents::list_documents,
        crate::inbound::http::documents::get_document,
        crate::inbound::http::documents::create_document,
        crate::inbound::http::documents::change_status,
        crate::inbound::http::documents::submit_return,
        crate::inbound::http::documents::delete_document,
        crate::inbound::http::documents::stats,
        crate::inbound::http::uploads::download,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        UserSchema,
        RoleSchema,
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        LoginResponse,
        DocumentResponse,
        AttachmentResponse,
        StatusRequest,
        StatsResponse,
        NewDocumentUpload,
        ReturnUpload,
    )),
    tags(
        (name = "users", description = "Sign-in and account lookups"),
        (name = "documents", description = "Document workflow and attachments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
