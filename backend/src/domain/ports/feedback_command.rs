//! Driving port for feedback mutations.

use async_trait::async_trait;

use crate::domain::{Error, Feedback, FeedbackContent, FeedbackId, FeedbackStatus, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackCommand: Send + Sync {
    async fn submit(&self, user_id: &UserId, content: FeedbackContent) -> Result<Feedback, Error>;

    /// Owners and administrators may edit.
    async fn edit(
        &self,
        user_id: &UserId,
        id: FeedbackId,
        content: FeedbackContent,
    ) -> Result<Feedback, Error>;

    /// Administrators only.
    async fn change_status(
        &self,
        user_id: &UserId,
        id: FeedbackId,
        status: FeedbackStatus,
    ) -> Result<Feedback, Error>;
}
