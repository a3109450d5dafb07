//! Shared harness for end-to-end HTTP tests.
//!
//! Builds the production application over in-memory repositories and a
//! temporary upload directory, seeded with one administrator and two
//! consultants.

use std::path::Path;
use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{test, web};
use doctrack::domain::{AccountRegistry, AccountSeeder};
use doctrack::inbound::http::health::HealthState;
use doctrack::outbound::password::Argon2PasswordHasher;
use doctrack::server::{AppDependencies, Persistence, SESSION_COOKIE, ServerConfig, build_http_state};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const ADMIN: (&str, &str) = ("sergio.bandeira", "admin123");
pub const MAYCO: (&str, &str) = ("mayco.muniz", "consultor123");
pub const ANA: (&str, &str) = ("ana.lima", "consultor456");

const BOUNDARY: &str = "doctrack-e2e-boundary";

/// Application dependencies plus the storage they write to.
pub struct Harness {
    pub deps: AppDependencies,
    pub uploads: TempDir,
}

impl Harness {
    /// Number of files currently held in the upload directory.
    pub fn stored_files(&self) -> usize {
        count_files(self.uploads.path())
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

/// Build a seeded application with the given upload limit.
pub async fn harness(max_upload_bytes: usize) -> Harness {
    let uploads = TempDir::new().expect("upload dir");
    let persistence = Persistence::in_memory();
    let Persistence::Memory { users, .. } = &persistence else {
        panic!("expected memory persistence");
    };
    let registry = AccountRegistry::from_json(
        &json!({
            "accounts": [
                {"id": ADMIN.0, "name": "Sérgio Bandeira", "role": "ADMIN", "password": ADMIN.1},
                {"id": MAYCO.0, "name": "Mayco Muniz", "role": "CONSULTANT", "password": MAYCO.1},
                {"id": ANA.0, "name": "Ana Lima", "role": "CONSULTANT", "password": ANA.1}
            ]
        })
        .to_string(),
    )
    .expect("registry parses");
    AccountSeeder::new(Arc::clone(users), Arc::new(Argon2PasswordHasher::new()))
        .seed(&registry)
        .await
        .expect("accounts seed");

    let config = ServerConfig::new(
        Key::generate(),
        false,
        SameSite::Lax,
        "127.0.0.1:0".parse().expect("socket address"),
    )
    .with_persistence(persistence)
    .with_upload_dir(uploads.path())
    .with_max_upload_bytes(max_upload_bytes);
    let http_state = build_http_state(&config).expect("http state builds");

    Harness {
        deps: AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(http_state),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        },
        uploads,
    }
}

/// Send a request and decode the JSON body, `Null` when empty.
pub async fn call_json<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

/// Log in and return the session cookie.
pub async fn login<S, B>(app: &S, (username, password): (&str, &str)) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"username": username, "password": password}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "login for {username} failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// One multipart part.
#[derive(Clone, Copy)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode parts as `multipart/form-data`.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Multipart `POST` to `uri` as the holder of `cookie`.
pub fn multipart_post(uri: &str, cookie: &Cookie<'static>, parts: &[Part<'_>]) -> Request {
    let (content_type, body) = multipart(parts);
    test::TestRequest::post()
        .uri(uri)
        .cookie(cookie.clone())
        .insert_header((CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request()
}

/// Create a document for `consultant` and return its id.
pub async fn create_document<S, B>(
    app: &S,
    admin: &Cookie<'static>,
    title: &str,
    consultant: &str,
) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = call_json(
        app,
        multipart_post(
            "/api/documents",
            admin,
            &[
                Part::Text("title", title),
                Part::Text("consultantId", consultant),
                Part::File("file", "contrato.pdf", b"%PDF-1.7 initial"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_str().expect("document id").to_owned()
}

/// `PATCH /api/documents/{id}/status`.
pub fn status_request(id: &str, cookie: &Cookie<'static>, status: &str) -> Request {
    test::TestRequest::patch()
        .uri(&format!("/api/documents/{id}/status"))
        .cookie(cookie.clone())
        .set_json(json!({"status": status}))
        .to_request()
}

/// Authenticated `GET`.
pub fn get(uri: &str, cookie: &Cookie<'static>) -> Request {
    test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request()
}
