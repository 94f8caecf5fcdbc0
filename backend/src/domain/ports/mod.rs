//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the OAuth provider, the job queue) are
//! implemented in `outbound`; driving ports (commands and queries) are
//! implemented by the domain services and called from `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod conversation_command;
mod conversation_query;
mod conversation_repository;
mod feedback_command;
mod feedback_query;
mod feedback_repository;
mod itinerary_command;
mod itinerary_query;
mod itinerary_repository;
mod job_queue;
mod oauth_provider;
mod reference_command;
mod reference_query;
mod reference_repository;
mod sign_in_command;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use conversation_command::MockConversationCommand;
pub use conversation_command::ConversationCommand;
#[cfg(test)]
pub use conversation_query::MockConversationQuery;
pub use conversation_query::{ConversationQuery, ConversationStart};
#[cfg(test)]
pub use conversation_repository::MockConversationRepository;
pub use conversation_repository::{ConversationRepository, ConversationRepositoryError};
#[cfg(test)]
pub use feedback_command::MockFeedbackCommand;
pub use feedback_command::FeedbackCommand;
#[cfg(test)]
pub use feedback_query::MockFeedbackQuery;
pub use feedback_query::FeedbackQuery;
#[cfg(test)]
pub use feedback_repository::MockFeedbackRepository;
pub use feedback_repository::{FeedbackRepository, FeedbackRepositoryError};
#[cfg(test)]
pub use itinerary_command::MockItineraryCommand;
pub use itinerary_command::{ItineraryCommand, NewItinerary};
#[cfg(test)]
pub use itinerary_query::MockItineraryQuery;
pub use itinerary_query::ItineraryQuery;
#[cfg(test)]
pub use itinerary_repository::MockItineraryRepository;
pub use itinerary_repository::{ItineraryRepository, ItineraryRepositoryError};
pub use job_queue::{
    CacheProviderDataJob, FixtureJobQueue, JobDispatchError, JobHandler, JobQueue,
};
#[cfg(test)]
pub use job_queue::{MockJobHandler, MockJobQueue};
#[cfg(test)]
pub use oauth_provider::MockOAuthProvider;
pub use oauth_provider::{FIXTURE_UID, FixtureOAuthProvider, OAuthProvider, OAuthProviderError};
#[cfg(test)]
pub use reference_command::MockReferenceCommand;
pub use reference_command::ReferenceCommand;
#[cfg(test)]
pub use reference_query::MockReferenceQuery;
pub use reference_query::ReferenceQuery;
#[cfg(test)]
pub use reference_repository::MockReferenceRepository;
pub use reference_repository::{ReferenceRepository, ReferenceRepositoryError};
#[cfg(test)]
pub use sign_in_command::MockSignInCommand;
pub use sign_in_command::SignInCommand;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
