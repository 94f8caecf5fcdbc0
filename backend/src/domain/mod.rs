//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the HTTP and
//! persistence adapters, and the services implementing the driving ports.
//! Keep types immutable outside their documented mutators and document
//! invariants and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - User: member signed in through an OAuth provider.
//! - Itinerary: a published ride offer.
//! - Conversation: messages between a passenger and a driver.
//! - Reference: a passenger's review of a driver.
//! - Feedback: bug reports and ideas.

pub mod auth;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod geo;
pub mod itinerary;
pub mod ports;
pub mod reference;
pub mod trace_id;
pub mod user;

mod conversation_service;
mod feedback_service;
mod itinerary_service;
mod provider_data_job;
mod reference_service;
mod sign_in_service;
mod users_service;

pub use self::auth::{
    AccessToken, AuthProvider, AuthValidationError, AuthorizationCode, OAuthIdentity, OAuthState,
    ProviderCredentials, ProviderData, ProviderLike, ProviderUid,
};
pub use self::conversation::{
    BODY_MAX, BodyValidationError, Conversable, Conversation, ConversationError, ConversationId,
    ConversationRecord, Message, MessageBody, Participant,
};
pub use self::conversation_service::ConversationService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::feedback::{
    Feedback, FeedbackContent, FeedbackId, FeedbackMessage, FeedbackRecord, FeedbackStatus,
    FeedbackType, FeedbackValidationError,
};
pub use self::feedback_service::FeedbackService;
pub use self::geo::{GeoBounds, GeoValidationError, LatLng};
pub use self::itinerary::{
    DEFAULT_SEARCH_RADIUS_KM, Itinerary, ItineraryDraft, ItineraryId, ItinerarySearch,
    ItineraryValidationError, MAX_SEARCH_RADIUS_KM, Place,
};
pub use self::itinerary_service::ItineraryService;
pub use self::provider_data_job::ProviderDataCacher;
pub use self::reference::{
    InvalidRating, Rating, Reference, ReferenceBody, ReferenceEntry, ReferenceError, ReferenceId,
    ReferenceRecord, ReferenceSummary,
};
pub use self::reference_service::ReferenceService;
pub use self::sign_in_service::SignInService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, ProviderDataCache, User, UserId, UserProfile, UserRecord,
    UserValidationError,
};
pub use self::users_service::UsersService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use icare::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
