//! Request identity for authenticated handlers.
//!
//! [`Authenticated`] resolves the session's user id against the user store on
//! every request, so a deleted account loses access immediately. Handlers
//! take it as an extractor and pass [`Authenticated::caller`] to the domain.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::ports::UsersQuery;
use crate::domain::{Caller, Error, User};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const LOGIN_REQUIRED: &str = "login required";

/// Signed-in user resolved for the current request.
#[derive(Debug, Clone)]
pub struct Authenticated {
    user: User,
}

impl Authenticated {
    /// Resolve the session user through `users`.
    ///
    /// A session pointing at a user that no longer exists is purged.
    pub async fn resolve(session: &SessionContext, users: &dyn UsersQuery) -> Result<Self, Error> {
        let id = session.require_user_id()?;
        match users.find_user(&id).await? {
            Some(user) => Ok(Self { user }),
            None => {
                debug!(user_id = %id, "session user no longer exists");
                session.purge();
                Err(Error::unauthorized(LOGIN_REQUIRED))
            }
        }
    }

    /// Identity passed to domain services.
    pub fn caller(&self) -> Caller {
        Caller::new(self.user.id().clone(), self.user.role())
    }

    /// The signed-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Consume the extractor, keeping the user.
    pub fn into_user(self) -> User {
        self.user
    }
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let session = session.await?;
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            Ok(Self::resolve(&session, state.users.as_ref()).await?)
        })
    }
}
