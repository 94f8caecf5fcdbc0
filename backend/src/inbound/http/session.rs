//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers deal with domain-friendly
//! operations: the signed-in user id, the pending OAuth `state` and the
//! one-shot flash message shown after a redirect.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, OAuthState, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const OAUTH_STATE_KEY: &str = "oauth_state";
pub(crate) const FLASH_KEY: &str = "flash";

/// One-shot message displayed by the client after a redirect.
///
/// `error` carries a localisation key such as `flash.sessions.error.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl Flash {
    pub fn error(key: impl Into<String>) -> Self {
        Self {
            error: Some(key.into()),
            notice: None,
        }
    }
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

fn write_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

fn read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id, renewing the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(write_error)
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self.0.get::<String>(USER_ID_KEY).map_err(read_error)?;
        match id {
            Some(raw) => match UserId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    tracing::warn!("invalid user id in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop everything stored in the session.
    pub fn purge(&self) {
        self.0.purge();
    }

    pub fn store_oauth_state(&self, state: &OAuthState) -> Result<(), Error> {
        self.0
            .insert(OAUTH_STATE_KEY, state.as_ref())
            .map_err(write_error)
    }

    /// Remove and return the pending OAuth state; it is single use.
    pub fn take_oauth_state(&self) -> Result<Option<OAuthState>, Error> {
        let stored = self.0.remove_as::<String>(OAUTH_STATE_KEY);
        match stored {
            Some(Ok(raw)) => Ok(Some(OAuthState::from_stored(raw))),
            Some(Err(raw)) => Err(read_error(format!("malformed oauth state {raw:?}"))),
            None => Ok(None),
        }
    }

    pub fn set_flash(&self, flash: &Flash) -> Result<(), Error> {
        self.0.insert(FLASH_KEY, flash).map_err(write_error)
    }

    /// Remove and return the pending flash message.
    pub fn take_flash(&self) -> Option<Flash> {
        match self.0.remove_as::<Flash>(FLASH_KEY) {
            Some(Ok(flash)) => Some(flash),
            Some(Err(raw)) => {
                tracing::warn!(raw = %raw, "discarding malformed flash message");
                None
            }
            None => None,
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[actix_web::test]
    async fn round_trips_user_id() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        session.persist_user(&UserId::new(USER).expect("fixture id"))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let id = session.require_user_id()?;
                        Ok::<_, Error>(HttpResponse::Ok().body(id.to_string()))
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set_res);

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        assert_eq!(test::read_body(get_res).await, USER);
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorised() {
        let app = test::init_service(App::new().wrap(test_session_middleware()).route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                session.require_user_id()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn flash_is_shown_once() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/fail",
                    web::get().to(|session: SessionContext| async move {
                        session.set_flash(&Flash::error("flash.sessions.error.create"))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/flash",
                    web::get().to(|session: SessionContext| async move {
                        let first = session.take_flash();
                        let second = session.take_flash();
                        HttpResponse::Ok().json((first, second))
                    }),
                ),
        )
        .await;

        let fail = test::call_service(&app, test::TestRequest::get().uri("/fail").to_request()).await;
        let cookie = session_cookie(&fail);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/flash").cookie(cookie).to_request(),
        )
        .await;
        let (first, second): (Option<Flash>, Option<Flash>) = test::read_body_json(res).await;
        assert_eq!(first, Some(Flash::error("flash.sessions.error.create")));
        assert_eq!(second, None);
    }
}
