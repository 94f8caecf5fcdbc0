//! Driving port for feedback reads.

use async_trait::async_trait;

use crate::domain::{Error, Feedback, FeedbackId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackQuery: Send + Sync {
    /// Every feedback, newest first.
    async fn list(&self) -> Result<Vec<Feedback>, Error>;

    async fn get(&self, id: FeedbackId) -> Result<Feedback, Error>;
}
