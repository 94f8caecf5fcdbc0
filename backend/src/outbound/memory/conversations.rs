//! In-memory `ConversationRepository`.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{ConversationRepository, ConversationRepositoryError};
use crate::domain::{Conversable, Conversation, ConversationId, UserId};

#[derive(Debug, Default)]
pub struct MemoryConversationRepository {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl MemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for MemoryConversationRepository {
    async fn save(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError> {
        let mut conversations = self.conversations.write().await;
        let duplicate = conversations.values().any(|existing| {
            existing.id() != conversation.id()
                && existing.conversable() == conversation.conversable()
                && existing.passenger_id() == conversation.passenger_id()
        });
        if duplicate {
            return Err(ConversationRepositoryError::duplicate(format!(
                "passenger {} already wrote about {}",
                conversation.passenger_id(),
                conversation.conversable().id()
            )));
        }
        conversations.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn find_for_conversable_and_user(
        &self,
        conversable: &Conversable,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .find(|conversation| {
                conversation.conversable() == *conversable && conversation.is_participant(user_id)
            })
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        let mut found: Vec<Conversation> = self
            .conversations
            .read()
            .await
            .values()
            .filter(|conversation| conversation.is_participant(user_id))
            .cloned()
            .collect();
        found.sort_by_key(|conversation| Reverse(conversation.updated_at()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItineraryId, MessageBody};
    use crate::test_support::fixture_timestamp;
    use chrono::Duration;
    use rstest::rstest;

    fn thread(sender: &UserId, conversable: Conversable, minutes: i64) -> Conversation {
        Conversation::start(
            conversable,
            sender.clone(),
            UserId::random(),
            MessageBody::new("Still a seat?").expect("body"),
            fixture_timestamp() + Duration::minutes(minutes),
        )
        .expect("distinct participants")
    }

    #[rstest]
    #[tokio::test]
    async fn threads_are_listed_most_recent_first() {
        let repo = MemoryConversationRepository::new();
        let passenger = UserId::random();
        let older = thread(&passenger, Conversable::Itinerary(ItineraryId::random()), 0);
        let newer = thread(&passenger, Conversable::Itinerary(ItineraryId::random()), 10);
        repo.save(&older).await.expect("save");
        repo.save(&newer).await.expect("save");
        repo.save(&thread(&UserId::random(), Conversable::Itinerary(ItineraryId::random()), 5))
            .await
            .expect("save");

        let listed = repo.list_for_user(&passenger).await.expect("list");
        let ids: Vec<_> = listed.iter().map(Conversation::id).collect();
        assert_eq!(ids, vec![newer.id(), older.id()]);
    }

    #[rstest]
    #[tokio::test]
    async fn lookup_by_conversable_requires_participation() {
        let repo = MemoryConversationRepository::new();
        let passenger = UserId::random();
        let conversable = Conversable::Itinerary(ItineraryId::random());
        repo.save(&thread(&passenger, conversable, 0))
            .await
            .expect("save");

        let mine = repo
            .find_for_conversable_and_user(&conversable, &passenger)
            .await
            .expect("query");
        let theirs = repo
            .find_for_conversable_and_user(&conversable, &UserId::random())
            .await
            .expect("query");
        assert!(mine.is_some());
        assert!(theirs.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn one_thread_per_passenger_and_conversable() {
        let repo = MemoryConversationRepository::new();
        let passenger = UserId::random();
        let conversable = Conversable::Itinerary(ItineraryId::random());
        let first = thread(&passenger, conversable, 0);
        repo.save(&first).await.expect("first");
        repo.save(&first).await.expect("resave");

        let err = repo
            .save(&thread(&passenger, conversable, 5))
            .await
            .expect_err("second thread");
        assert!(matches!(err, ConversationRepositoryError::Duplicate { .. }));
        repo.save(&thread(&UserId::random(), conversable, 5))
            .await
            .expect("another passenger");
    }
}
