//! Port for conversation persistence.
//!
//! Conversations are saved as whole aggregates: participants with their read
//! markers and every message.

use async_trait::async_trait;

use crate::domain::{Conversable, Conversation, ConversationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by conversation repository adapters.
    pub enum ConversationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "conversation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "conversation repository query failed: {message}",
        /// The passenger already has a conversation about the conversable.
        Duplicate { message: String } =>
            "conversation already exists: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Insert or update a conversation with its participants and messages.
    ///
    /// Fails with `Duplicate` when a different conversation already exists
    /// for the same conversable and passenger.
    async fn save(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError>;

    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// The conversation `user_id` takes part in about `conversable`, if any.
    async fn find_for_conversable_and_user(
        &self,
        conversable: &Conversable,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// Conversations involving `user_id`, most recently updated first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError>;
}
