//! In-memory application wiring the real services for end-to-end tests.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use mockable::Clock;

use super::clock::{FixtureClock, fixture_timestamp};
use super::fixtures::facebook_identity;
use crate::domain::ports::{FixtureJobQueue, FixtureOAuthProvider, UserRepository};
use crate::domain::{
    ConversationService, Error, FeedbackService, ItineraryService, ReferenceService,
    SignInService, User, UserId, UsersService,
};
use crate::inbound::http::api_scope;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{
    MemoryConversationRepository, MemoryFeedbackRepository, MemoryItineraryRepository,
    MemoryReferenceRepository, MemoryUserRepository,
};
use crate::settings::Settings;

const LOGIN_PATH: &str = "/__test/login";

/// Services over in-memory repositories plus handles to inspect them.
pub struct MemoryApp {
    pub clock: Arc<FixtureClock>,
    pub users: Arc<MemoryUserRepository>,
    pub itineraries: Arc<MemoryItineraryRepository>,
    pub conversations: Arc<MemoryConversationRepository>,
    pub references: Arc<MemoryReferenceRepository>,
    pub feedbacks: Arc<MemoryFeedbackRepository>,
    state: HttpState,
    key: Key,
}

/// Build a [`MemoryApp`] from default settings and the fixture clock.
///
/// Sign-in goes through [`FixtureOAuthProvider`]; background jobs are
/// discarded.
pub fn memory_app() -> MemoryApp {
    let settings = Settings::default();
    let clock = Arc::new(FixtureClock::new(fixture_timestamp()));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let users = Arc::new(MemoryUserRepository::new());
    let itineraries = Arc::new(MemoryItineraryRepository::new());
    let conversations = Arc::new(MemoryConversationRepository::new());
    let references = Arc::new(MemoryReferenceRepository::new());
    let feedbacks = Arc::new(MemoryFeedbackRepository::new());

    let restriction = match settings.itineraries.restriction() {
        Ok(restriction) => restriction,
        Err(err) => panic!("default restriction is valid: {err}"),
    };

    let itinerary_service = Arc::new(ItineraryService::new(
        itineraries.clone(),
        dyn_clock.clone(),
        restriction,
    ));
    let conversation_service = Arc::new(ConversationService::new(
        conversations.clone(),
        itineraries.clone(),
        dyn_clock.clone(),
    ));
    let reference_service = Arc::new(ReferenceService::new(
        references.clone(),
        itineraries.clone(),
        dyn_clock.clone(),
    ));
    let feedback_service = Arc::new(FeedbackService::new(
        feedbacks.clone(),
        users.clone(),
        dyn_clock.clone(),
    ));
    let public = match settings.public() {
        Ok(public) => public,
        Err(err) => panic!("default settings are valid: {err}"),
    };
    let state = HttpState::new(
        HttpStatePorts {
            sign_in: Arc::new(SignInService::new(
                Arc::new(FixtureOAuthProvider::default()),
                users.clone(),
                Arc::new(FixtureJobQueue),
                dyn_clock,
            )),
            users: Arc::new(UsersService::new(users.clone())),
            itineraries: itinerary_service.clone(),
            itineraries_query: itinerary_service,
            conversations: conversation_service.clone(),
            conversations_query: conversation_service,
            references: reference_service.clone(),
            references_query: reference_service,
            feedbacks: feedback_service.clone(),
            feedbacks_query: feedback_service,
        },
        public,
    );

    MemoryApp {
        clock,
        users,
        itineraries,
        conversations,
        references,
        feedbacks,
        state,
        key: Key::generate(),
    }
}

async fn test_login(session: SessionContext, id: web::Path<String>) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(id.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

impl MemoryApp {
    /// Handler state shared by every app built from this harness.
    pub fn state(&self) -> HttpState {
        self.state.clone()
    }

    /// API application with insecure session cookies and a login shortcut.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
                    .cookie_name("session".to_owned())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(self.state()))
            .route(&format!("{LOGIN_PATH}/{{id}}"), web::post().to(test_login))
            .service(api_scope())
    }

    /// Store a Facebook user as if they had signed in once.
    pub async fn register(&self, uid: &str, name: &str) -> User {
        let user = User::from_identity(&facebook_identity(uid, name), self.clock.utc());
        if let Err(err) = self.users.save(&user).await {
            panic!("store fixture user: {err}");
        }
        user
    }

    /// Store a user holding administrator rights.
    pub async fn register_admin(&self, uid: &str, name: &str) -> User {
        let mut user = User::from_identity(&facebook_identity(uid, name), self.clock.utc());
        user.promote_to_admin(self.clock.utc());
        if let Err(err) = self.users.save(&user).await {
            panic!("store fixture admin: {err}");
        }
        user
    }
}

/// Request establishing a session for `user_id` in a [`MemoryApp::app`].
pub fn login_request(user_id: &UserId) -> test::TestRequest {
    test::TestRequest::post().uri(&format!("{LOGIN_PATH}/{user_id}"))
}
