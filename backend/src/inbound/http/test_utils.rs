//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};

use crate::domain::ports::{
    MockConversationCommand, MockConversationQuery, MockFeedbackCommand, MockFeedbackQuery,
    MockItineraryCommand, MockItineraryQuery, MockReferenceCommand, MockReferenceQuery,
    MockSignInCommand, MockUsersQuery,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::settings::Settings;

/// Session middleware with a fresh key and insecure cookies for plain HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the session cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mocked driving ports; unexpected calls panic.
#[derive(Default)]
pub struct TestPorts {
    pub sign_in: MockSignInCommand,
    pub users: MockUsersQuery,
    pub itineraries: MockItineraryCommand,
    pub itineraries_query: MockItineraryQuery,
    pub conversations: MockConversationCommand,
    pub conversations_query: MockConversationQuery,
    pub references: MockReferenceCommand,
    pub references_query: MockReferenceQuery,
    pub feedbacks: MockFeedbackCommand,
    pub feedbacks_query: MockFeedbackQuery,
}

impl TestPorts {
    pub fn into_state(self) -> HttpState {
        let settings = Settings::default()
            .public()
            .expect("default settings are valid");
        HttpState::new(
            HttpStatePorts {
                sign_in: Arc::new(self.sign_in),
                users: Arc::new(self.users),
                itineraries: Arc::new(self.itineraries),
                itineraries_query: Arc::new(self.itineraries_query),
                conversations: Arc::new(self.conversations),
                conversations_query: Arc::new(self.conversations_query),
                references: Arc::new(self.references),
                references_query: Arc::new(self.references_query),
                feedbacks: Arc::new(self.feedbacks),
                feedbacks_query: Arc::new(self.feedbacks_query),
            },
            settings,
        )
    }
}

const LOGIN_PATH: &str = "/__test/login";

async fn test_login(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(id.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Full API application over `ports` plus a login shortcut.
pub fn test_app(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(ports.into_state()))
        .route(&format!("{LOGIN_PATH}/{{id}}"), web::post().to(test_login))
        .service(super::api_scope())
}

/// Request establishing a session for `user_id` in a [`test_app`].
pub fn login_request(user_id: &UserId) -> test::TestRequest {
    test::TestRequest::post().uri(&format!("{LOGIN_PATH}/{user_id}"))
}
