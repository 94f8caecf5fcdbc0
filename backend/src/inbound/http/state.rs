//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ConversationCommand, ConversationQuery, FeedbackCommand, FeedbackQuery, ItineraryCommand,
    ItineraryQuery, ReferenceCommand, ReferenceQuery, SignInCommand, UsersQuery,
};
use crate::settings::PublicSettings;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub sign_in: Arc<dyn SignInCommand>,
    pub users: Arc<dyn UsersQuery>,
    pub itineraries: Arc<dyn ItineraryCommand>,
    pub itineraries_query: Arc<dyn ItineraryQuery>,
    pub conversations: Arc<dyn ConversationCommand>,
    pub conversations_query: Arc<dyn ConversationQuery>,
    pub references: Arc<dyn ReferenceCommand>,
    pub references_query: Arc<dyn ReferenceQuery>,
    pub feedbacks: Arc<dyn FeedbackCommand>,
    pub feedbacks_query: Arc<dyn FeedbackQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sign_in: Arc<dyn SignInCommand>,
    pub users: Arc<dyn UsersQuery>,
    pub itineraries: Arc<dyn ItineraryCommand>,
    pub itineraries_query: Arc<dyn ItineraryQuery>,
    pub conversations: Arc<dyn ConversationCommand>,
    pub conversations_query: Arc<dyn ConversationQuery>,
    pub references: Arc<dyn ReferenceCommand>,
    pub references_query: Arc<dyn ReferenceQuery>,
    pub feedbacks: Arc<dyn FeedbackCommand>,
    pub feedbacks_query: Arc<dyn FeedbackQuery>,
    /// Client-visible settings served by `GET /api/v1/settings`.
    pub settings: Arc<PublicSettings>,
}

impl HttpState {
    /// Construct state from the ports bundle and the public settings.
    pub fn new(ports: HttpStatePorts, settings: PublicSettings) -> Self {
        let HttpStatePorts {
            sign_in,
            users,
            itineraries,
            itineraries_query,
            conversations,
            conversations_query,
            references,
            references_query,
            feedbacks,
            feedbacks_query,
        } = ports;
        Self {
            sign_in,
            users,
            itineraries,
            itineraries_query,
            conversations,
            conversations_query,
            references,
            references_query,
            feedbacks,
            feedbacks_query,
            settings: Arc::new(settings),
        }
    }
}
