//! Driving port for conversation mutations.

use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Error, ItineraryId, MessageBody, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationCommand: Send + Sync {
    /// Start a conversation with the driver of `itinerary_id`.
    ///
    /// Fails with `conflict` when the sender already has one for that
    /// itinerary and `forbidden` when the sender drives it.
    async fn start(
        &self,
        sender_id: &UserId,
        itinerary_id: ItineraryId,
        body: MessageBody,
    ) -> Result<Conversation, Error>;

    /// Append a message; non-participants get `not_found`.
    async fn reply(
        &self,
        sender_id: &UserId,
        id: ConversationId,
        body: MessageBody,
    ) -> Result<Conversation, Error>;

    /// Fetch a conversation for display and mark it read for the viewer.
    async fn view(&self, viewer_id: &UserId, id: ConversationId) -> Result<Conversation, Error>;
}
