//! Driving port for conversation reads.

use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Error, Itinerary, ItineraryId, UserId};

/// Outcome of preparing a new conversation about an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationStart {
    /// The user already talks about this itinerary.
    Existing(ConversationId),
    /// Nothing yet; the draft targets the itinerary's driver.
    Draft(Itinerary),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationQuery: Send + Sync {
    /// Conversations of `user_id`, most recently updated first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error>;

    /// Conversations with messages `user_id` has not read yet.
    async fn list_unread(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error>;

    /// Number of conversations unread by `user_id`.
    async fn unread_count(&self, user_id: &UserId) -> Result<usize, Error>;

    /// Decide whether `user_id` may start talking about `itinerary_id`.
    async fn prepare(
        &self,
        user_id: &UserId,
        itinerary_id: ItineraryId,
    ) -> Result<ConversationStart, Error>;
}
