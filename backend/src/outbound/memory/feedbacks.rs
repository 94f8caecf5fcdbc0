//! In-memory `FeedbackRepository`.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{Feedback, FeedbackId};

#[derive(Debug, Default)]
pub struct MemoryFeedbackRepository {
    feedbacks: RwLock<HashMap<FeedbackId, Feedback>>,
}

impl MemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackRepository for MemoryFeedbackRepository {
    async fn save(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError> {
        self.feedbacks
            .write()
            .await
            .insert(feedback.id(), feedback.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &FeedbackId,
    ) -> Result<Option<Feedback>, FeedbackRepositoryError> {
        Ok(self.feedbacks.read().await.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        let mut all: Vec<Feedback> = self.feedbacks.read().await.values().cloned().collect();
        all.sort_by_key(|feedback| Reverse(feedback.created_at()));
        Ok(all)
    }
}
