//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler together with the health
//! probes. Request and response bodies are picked up from the handler
//! annotations; the domain types that appear in several places are listed
//! explicitly so they get stable component names.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, FeedbackStatus, FeedbackType, GeoBounds, LatLng};
use crate::inbound::http::conversations::{
    ConversableResponse, ConversationDraftResponse, ConversationResponse,
    ConversationSummaryResponse, MessageRequest, MessageResponse, UnreadCountResponse,
};
use crate::inbound::http::feedbacks::{FeedbackRequest, FeedbackResponse, FeedbackStatusRequest};
use crate::inbound::http::itineraries::{
    ItineraryForm, ItineraryResponse, ItinerarySummary, PlaceResponse,
};
use crate::inbound::http::references::{
    ReferenceDraftResponse, ReferenceEntryResponse, ReferenceRequest, ReferenceResponse,
};
use crate::inbound::http::users::{
    CurrentUserResponse, FlashResponse, UserProfileResponse, UserSummary,
};
use crate::settings::PublicSettings;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by GET /api/v1/users/auth/facebook/callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Icare API",
        description = "Ride-sharing backend: itineraries, conversations, references and feedback.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::client_settings::client_settings,
        crate::inbound::http::auth::authorize,
        crate::inbound::http::auth::callback,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::sign_out,
        crate::inbound::http::users::pop_flash,
        crate::inbound::http::itineraries::create_itinerary,
        crate::inbound::http::itineraries::list_itineraries,
        crate::inbound::http::itineraries::search_itineraries,
        crate::inbound::http::itineraries::get_itinerary,
        crate::inbound::http::itineraries::delete_itinerary,
        crate::inbound::http::conversations::list_conversations,
        crate::inbound::http::conversations::new_conversation,
        crate::inbound::http::conversations::create_conversation,
        crate::inbound::http::conversations::unread_conversations,
        crate::inbound::http::conversations::unread_count,
        crate::inbound::http::conversations::get_conversation,
        crate::inbound::http::conversations::reply_to_conversation,
        crate::inbound::http::references::list_references,
        crate::inbound::http::references::new_reference,
        crate::inbound::http::references::create_reference,
        crate::inbound::http::references::get_reference,
        crate::inbound::http::references::answer_reference,
        crate::inbound::http::feedbacks::list_feedbacks,
        crate::inbound::http::feedbacks::create_feedback,
        crate::inbound::http::feedbacks::get_feedback,
        crate::inbound::http::feedbacks::update_feedback,
        crate::inbound::http::feedbacks::change_feedback_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LatLng,
        GeoBounds,
        FeedbackType,
        FeedbackStatus,
        PublicSettings,
        UserSummary,
        UserProfileResponse,
        CurrentUserResponse,
        FlashResponse,
        ItineraryForm,
        PlaceResponse,
        ItineraryResponse,
        ItinerarySummary,
        MessageRequest,
        ConversableResponse,
        MessageResponse,
        ConversationSummaryResponse,
        ConversationResponse,
        ConversationDraftResponse,
        UnreadCountResponse,
        ReferenceRequest,
        ReferenceEntryResponse,
        ReferenceResponse,
        ReferenceDraftResponse,
        FeedbackRequest,
        FeedbackStatusRequest,
        FeedbackResponse,
    )),
    tags(
        (name = "settings", description = "Public client configuration"),
        (name = "auth", description = "Facebook sign-in"),
        (name = "users", description = "Profiles and the current session"),
        (name = "itineraries", description = "Ride offers"),
        (name = "conversations", description = "Private messaging about itineraries"),
        (name = "references", description = "Ratings left after a ride"),
        (name = "feedbacks", description = "Bug reports and ideas"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
