//! Builders for HTTP state ports and the background job wiring.
//!
//! Repositories are Diesel-backed when a pool is configured and in-memory
//! otherwise. The OAuth provider is the Facebook Graph adapter when
//! credentials are present; debug builds fall back to a fixture provider.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use icare::domain::ports::{
    ConversationRepository, FeedbackRepository, FixtureOAuthProvider, ItineraryRepository,
    JobHandler, OAuthProvider, ReferenceRepository, UserRepository,
};
use icare::domain::{
    ConversationService, FeedbackService, GeoBounds, ItineraryService, ProviderDataCacher,
    ReferenceService, SignInService, UsersService,
};
use icare::inbound::http::state::{HttpState, HttpStatePorts};
use icare::outbound::facebook::FacebookGraphProvider;
use icare::outbound::memory::{
    MemoryConversationRepository, MemoryFeedbackRepository, MemoryItineraryRepository,
    MemoryReferenceRepository, MemoryUserRepository,
};
use icare::outbound::persistence::{
    DbPool, DieselConversationRepository, DieselFeedbackRepository, DieselItineraryRepository,
    DieselReferenceRepository, DieselUserRepository,
};
use icare::outbound::queue::{JobWorker, TokioJobQueue};
use icare::settings::Settings;

use super::ServerConfig;

/// Everything the server needs besides the session settings.
pub(super) struct Wiring {
    pub(super) http_state: web::Data<HttpState>,
    pub(super) worker: JobWorker,
    pub(super) job_handler: Arc<dyn JobHandler>,
}

/// One repository per aggregate.
struct Repositories<U, I, C, R, F> {
    users: Arc<U>,
    itineraries: Arc<I>,
    conversations: Arc<C>,
    references: Arc<R>,
    feedbacks: Arc<F>,
}

/// Shared collaborators handed to every service.
struct Collaborators {
    provider: Arc<dyn OAuthProvider>,
    queue: Arc<TokioJobQueue>,
    clock: Arc<dyn Clock>,
    restriction: Option<GeoBounds>,
}

fn diesel_repositories(
    pool: &DbPool,
) -> Repositories<
    DieselUserRepository,
    DieselItineraryRepository,
    DieselConversationRepository,
    DieselReferenceRepository,
    DieselFeedbackRepository,
> {
    Repositories {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        itineraries: Arc::new(DieselItineraryRepository::new(pool.clone())),
        conversations: Arc::new(DieselConversationRepository::new(pool.clone())),
        references: Arc::new(DieselReferenceRepository::new(pool.clone())),
        feedbacks: Arc::new(DieselFeedbackRepository::new(pool.clone())),
    }
}

fn memory_repositories() -> Repositories<
    MemoryUserRepository,
    MemoryItineraryRepository,
    MemoryConversationRepository,
    MemoryReferenceRepository,
    MemoryFeedbackRepository,
> {
    Repositories {
        users: Arc::new(MemoryUserRepository::new()),
        itineraries: Arc::new(MemoryItineraryRepository::new()),
        conversations: Arc::new(MemoryConversationRepository::new()),
        references: Arc::new(MemoryReferenceRepository::new()),
        feedbacks: Arc::new(MemoryFeedbackRepository::new()),
    }
}

/// Build the driving ports and the provider data job handler over `repos`.
fn build_ports<U, I, C, R, F>(
    repos: Repositories<U, I, C, R, F>,
    collaborators: Collaborators,
) -> (HttpStatePorts, Arc<dyn JobHandler>)
where
    U: UserRepository + 'static,
    I: ItineraryRepository + 'static,
    C: ConversationRepository + 'static,
    R: ReferenceRepository + 'static,
    F: FeedbackRepository + 'static,
{
    let Repositories {
        users,
        itineraries,
        conversations,
        references,
        feedbacks,
    } = repos;
    let Collaborators {
        provider,
        queue,
        clock,
        restriction,
    } = collaborators;

    let itinerary_service = Arc::new(ItineraryService::new(
        itineraries.clone(),
        clock.clone(),
        restriction,
    ));
    let conversation_service = Arc::new(ConversationService::new(
        conversations,
        itineraries.clone(),
        clock.clone(),
    ));
    let reference_service = Arc::new(ReferenceService::new(
        references,
        itineraries,
        clock.clone(),
    ));
    let feedback_service = Arc::new(FeedbackService::new(
        feedbacks,
        users.clone(),
        clock.clone(),
    ));
    let job_handler: Arc<dyn JobHandler> = Arc::new(ProviderDataCacher::new(
        users.clone(),
        provider.clone(),
        clock.clone(),
    ));

    let ports = HttpStatePorts {
        sign_in: Arc::new(SignInService::new(provider, users.clone(), queue, clock)),
        users: Arc::new(UsersService::new(users)),
        itineraries: itinerary_service.clone(),
        itineraries_query: itinerary_service,
        conversations: conversation_service.clone(),
        conversations_query: conversation_service,
        references: reference_service.clone(),
        references_query: reference_service,
        feedbacks: feedback_service.clone(),
        feedbacks_query: feedback_service,
    };
    (ports, job_handler)
}

/// Pick the OAuth provider for this build.
///
/// # Errors
/// Fails when the Facebook settings are malformed, or when a release build
/// has no credentials.
pub(super) fn build_oauth_provider(settings: &Settings) -> io::Result<Arc<dyn OAuthProvider>> {
    let base_url = settings.app.base_url().map_err(io::Error::other)?;
    match settings
        .facebook
        .credentials(&base_url)
        .map_err(io::Error::other)?
    {
        Some(credentials) => {
            let provider = FacebookGraphProvider::new(credentials).map_err(io::Error::other)?;
            Ok(Arc::new(provider))
        }
        None if cfg!(debug_assertions) => {
            warn!("facebook credentials not set; signing in with the fixture provider (dev only)");
            Ok(Arc::new(FixtureOAuthProvider::default()))
        }
        None => Err(io::Error::other(
            "FACEBOOK_APP_ID and FACEBOOK_SECRET are required in release builds",
        )),
    }
}

/// Build the shared HTTP state plus the job worker it feeds.
///
/// # Errors
/// Propagates settings and provider construction failures.
pub(super) fn build_wiring(config: &ServerConfig) -> io::Result<Wiring> {
    let settings = &config.settings;
    let public = settings.public().map_err(io::Error::other)?;
    let restriction = settings
        .itineraries
        .restriction()
        .map_err(io::Error::other)?;
    let (queue, worker) = TokioJobQueue::channel(settings.jobs.queue_capacity());
    let collaborators = Collaborators {
        provider: build_oauth_provider(settings)?,
        queue: Arc::new(queue),
        clock: Arc::new(DefaultClock),
        restriction,
    };

    let (ports, job_handler) = match &config.db_pool {
        Some(pool) => build_ports(diesel_repositories(pool), collaborators),
        None => {
            warn!("DATABASE_URL not set; data lives in memory and is lost on restart");
            build_ports(memory_repositories(), collaborators)
        }
    };

    Ok(Wiring {
        http_state: web::Data::new(HttpState::new(ports, public)),
        worker,
        job_handler,
    })
}
