//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use crate::domain::ports::{
    MockBlobStore, MockDocumentCommand, MockDocumentQuery, MockLoginService, MockUsersQuery,
};
use crate::domain::{Error, Role, User, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Path of the test-only route that signs a user in.
pub const SIGN_IN_PATH: &str = "/__test/sign-in/{id}";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the `session` cookie set by a response.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Test-only handler storing the path's user id in the session.
///
/// Register it at [`SIGN_IN_PATH`] and call [`sign_in`].
pub async fn sign_in_handler(
    session: SessionContext,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let id = UserId::new(path.into_inner()).map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign `id` in through the test-only route and return the session cookie.
pub async fn sign_in<S>(app: &S, id: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(&format!("/__test/sign-in/{id}"))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(res.status().is_success(), "test sign-in failed");
    session_cookie(&res)
}

/// Build a user fixture.
pub fn user(id: &str, role: Role) -> User {
    User::try_from_strings(id, format!("User {id}"), role).expect("valid fixture user")
}

/// Port mocks with no expectations; tests set the ones they exercise.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub users: MockUsersQuery,
    pub documents: MockDocumentCommand,
    pub documents_query: MockDocumentQuery,
    pub files: MockBlobStore,
}

impl MockPorts {
    /// Resolve every session to `user`.
    pub fn signed_in_as(mut self, user: &User) -> Self {
        let user = user.clone();
        self.users
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        self
    }

    /// Freeze the mocks into handler state.
    pub fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            login: Arc::new(self.login),
            users: Arc::new(self.users),
            documents: Arc::new(self.documents),
            documents_query: Arc::new(self.documents_query),
            files: Arc::new(self.files),
        })
    }
}

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "doctrack-test-boundary";

/// One part of a hand-built multipart body.
pub enum Part<'a> {
    /// Plain text field.
    Text(&'a str, &'a str),
    /// File field: name, file name and content.
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode `parts` as `multipart/form-data` and return the content type and
/// body.
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
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
            Part::File(name, file_name, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
