//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{Persistence, build_http_state};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::documents::{
    change_status, create_document, delete_document, get_document, list_documents,
    multipart_config, stats, submit_return,
};
use crate::inbound::http::error::json_error_handler;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::uploads::download;
use crate::inbound::http::users::{current_user, list_consultants, login, logout};
use crate::middleware::Trace;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

const SESSION_TTL_DAYS: i64 = 7;

/// Everything one application instance needs; cloned per worker.
#[derive(Clone)]
pub struct AppDependencies {
    /// Probe flags.
    pub health_state: web::Data<HealthState>,
    /// Handler ports.
    pub http_state: web::Data<HttpState>,
    /// Session signing and encryption key.
    pub key: Key,
    /// Whether the session cookie requires HTTPS.
    pub cookie_secure: bool,
    /// Session cookie `SameSite` policy.
    pub same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(SESSION_TTL_DAYS)))
        .build()
}

/// Assemble the application: `/api` routes, upload downloads, health
/// probes and, in debug builds, Swagger UI.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;
    let multipart = multipart_config(http_state.max_upload_bytes);

    let api = web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(multipart)
        .service(login)
        .service(logout)
        .service(current_user)
        .service(list_consultants)
        .service(list_documents)
        .service(create_document)
        .service(get_document)
        .service(change_status)
        .service(submit_return)
        .service(delete_document)
        .service(stats);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(session_middleware(key, cookie_secure, same_site))
        .wrap(Trace)
        .service(api)
        .service(download)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Readiness is reported once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when the upload directory cannot be opened
/// or when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_http_state(&config).map_err(std::io::Error::other)?);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        persistence,
        upload_dir,
        ..
    } = config;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    info!(
        %bind_addr,
        persistence = persistence.kind(),
        upload_dir = %upload_dir.display(),
        "server listening"
    );
    health_state.mark_ready();
    Ok(server)
}
