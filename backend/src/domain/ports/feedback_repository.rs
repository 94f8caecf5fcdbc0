//! Port for feedback persistence.

use async_trait::async_trait;

use crate::domain::{Feedback, FeedbackId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feedback repository adapters.
    pub enum FeedbackRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "feedback repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "feedback repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Insert or update a feedback.
    async fn save(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError>;

    async fn find_by_id(&self, id: &FeedbackId)
    -> Result<Option<Feedback>, FeedbackRepositoryError>;

    /// Every feedback, newest first.
    async fn list_all(&self) -> Result<Vec<Feedback>, FeedbackRepositoryError>;
}
