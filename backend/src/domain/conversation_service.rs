//! Conversation domain service implementing the conversation driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::itinerary_service::require_itinerary;
use crate::domain::ports::{
    ConversationCommand, ConversationQuery, ConversationRepository, ConversationRepositoryError,
    ConversationStart, ItineraryRepository,
};
use crate::domain::{
    Conversable, Conversation, ConversationError, ConversationId, Error, ItineraryId,
    MessageBody, UserId,
};

fn map_repository_error(error: ConversationRepositoryError) -> Error {
    match error {
        ConversationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("conversation repository unavailable: {message}"))
        }
        ConversationRepositoryError::Query { message } => {
            Error::internal(format!("conversation repository error: {message}"))
        }
        ConversationRepositoryError::Duplicate { .. } => already_started(),
    }
}

fn already_started() -> Error {
    Error::conflict("a conversation about this itinerary already exists")
}

fn conversation_not_found(id: ConversationId) -> Error {
    Error::not_found(format!("conversation {id} not found"))
}

fn map_conversation_error(error: ConversationError, id: ConversationId) -> Error {
    match error {
        ConversationError::NotParticipant => conversation_not_found(id),
        ConversationError::SelfConversation => Error::forbidden(error.to_string()),
    }
}

#[derive(Clone)]
pub struct ConversationService<C, I> {
    conversations: Arc<C>,
    itineraries: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<C, I> ConversationService<C, I> {
    pub fn new(conversations: Arc<C>, itineraries: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            conversations,
            itineraries,
            clock,
        }
    }
}

impl<C, I> ConversationService<C, I>
where
    C: ConversationRepository,
    I: ItineraryRepository,
{
    /// Load a conversation the user takes part in; others get `not_found`.
    async fn require_participation(
        &self,
        user_id: &UserId,
        id: ConversationId,
    ) -> Result<Conversation, Error> {
        let conversation = self
            .conversations
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| conversation_not_found(id))?;
        if !conversation.is_participant(user_id) {
            return Err(conversation_not_found(id));
        }
        Ok(conversation)
    }

    async fn existing_for(
        &self,
        user_id: &UserId,
        itinerary_id: ItineraryId,
    ) -> Result<Option<Conversation>, Error> {
        self.conversations
            .find_for_conversable_and_user(&Conversable::Itinerary(itinerary_id), user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), Error> {
        self.conversations
            .save(conversation)
            .await
            .map_err(map_repository_error)
    }
}

fn own_itinerary_error() -> Error {
    Error::forbidden("you cannot start a conversation about your own itinerary")
}

#[async_trait]
impl<C, I> ConversationCommand for ConversationService<C, I>
where
    C: ConversationRepository,
    I: ItineraryRepository,
{
    async fn start(
        &self,
        sender_id: &UserId,
        itinerary_id: ItineraryId,
        body: MessageBody,
    ) -> Result<Conversation, Error> {
        let itinerary = require_itinerary(self.itineraries.as_ref(), &itinerary_id).await?;
        if itinerary.is_driven_by(sender_id) {
            return Err(own_itinerary_error());
        }
        if let Some(existing) = self.existing_for(sender_id, itinerary_id).await? {
            return Err(already_started().with_details(json!({ "conversationId": existing.id() })));
        }

        let conversation = Conversation::start(
            Conversable::Itinerary(itinerary_id),
            sender_id.clone(),
            itinerary.driver_id().clone(),
            body,
            self.clock.utc(),
        )
        .map_err(|err| Error::forbidden(err.to_string()))?;
        self.save(&conversation).await?;
        info!(conversation_id = %conversation.id(), %itinerary_id, "conversation started");
        Ok(conversation)
    }

    async fn reply(
        &self,
        sender_id: &UserId,
        id: ConversationId,
        body: MessageBody,
    ) -> Result<Conversation, Error> {
        let mut conversation = self.require_participation(sender_id, id).await?;
        conversation
            .reply(sender_id, body, self.clock.utc())
            .map_err(|err| map_conversation_error(err, id))?;
        self.save(&conversation).await?;
        Ok(conversation)
    }

    async fn view(&self, viewer_id: &UserId, id: ConversationId) -> Result<Conversation, Error> {
        let mut conversation = self.require_participation(viewer_id, id).await?;
        if conversation.is_unread_for(viewer_id) {
            conversation
                .mark_as_read(viewer_id, self.clock.utc())
                .map_err(|err| map_conversation_error(err, id))?;
            self.save(&conversation).await?;
        }
        Ok(conversation)
    }
}

#[async_trait]
impl<C, I> ConversationQuery for ConversationService<C, I>
where
    C: ConversationRepository,
    I: ItineraryRepository,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error> {
        self.conversations
            .list_for_user(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn list_unread(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error> {
        let conversations = self.list(user_id).await?;
        Ok(conversations
            .into_iter()
            .filter(|conversation| conversation.is_unread_for(user_id))
            .collect())
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<usize, Error> {
        Ok(self.list_unread(user_id).await?.len())
    }

    async fn prepare(
        &self,
        user_id: &UserId,
        itinerary_id: ItineraryId,
    ) -> Result<ConversationStart, Error> {
        let itinerary = require_itinerary(self.itineraries.as_ref(), &itinerary_id).await?;
        if itinerary.is_driven_by(user_id) {
            return Err(own_itinerary_error());
        }
        Ok(match self.existing_for(user_id, itinerary_id).await? {
            Some(existing) => ConversationStart::Existing(existing.id()),
            None => ConversationStart::Draft(itinerary),
        })
    }
}

#[cfg(test)]
#[path = "conversation_service_tests.rs"]
mod tests;
