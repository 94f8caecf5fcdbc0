//! Feedback domain service implementing the feedback driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    FeedbackCommand, FeedbackQuery, FeedbackRepository, FeedbackRepositoryError, UserRepository,
};
use crate::domain::sign_in_service::map_user_repository_error;
use crate::domain::{
    Error, Feedback, FeedbackContent, FeedbackId, FeedbackStatus, User, UserId,
};

fn map_repository_error(error: FeedbackRepositoryError) -> Error {
    match error {
        FeedbackRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("feedback repository unavailable: {message}"))
        }
        FeedbackRepositoryError::Query { message } => {
            Error::internal(format!("feedback repository error: {message}"))
        }
    }
}

#[derive(Clone)]
pub struct FeedbackService<F, U> {
    feedbacks: Arc<F>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<F, U> FeedbackService<F, U> {
    pub fn new(feedbacks: Arc<F>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            feedbacks,
            users,
            clock,
        }
    }
}

impl<F, U> FeedbackService<F, U>
where
    F: FeedbackRepository,
    U: UserRepository,
{
    async fn require_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    async fn require_feedback(&self, id: FeedbackId) -> Result<Feedback, Error> {
        self.feedbacks
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("feedback {id} not found")))
    }

    async fn save(&self, feedback: &Feedback) -> Result<(), Error> {
        self.feedbacks
            .save(feedback)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<F, U> FeedbackCommand for FeedbackService<F, U>
where
    F: FeedbackRepository,
    U: UserRepository,
{
    async fn submit(&self, user_id: &UserId, content: FeedbackContent) -> Result<Feedback, Error> {
        let feedback = Feedback::submit(user_id.clone(), content, self.clock.utc());
        self.save(&feedback).await?;
        info!(feedback_id = %feedback.id(), kind = feedback.content().kind.as_str(), "feedback submitted");
        Ok(feedback)
    }

    async fn edit(
        &self,
        user_id: &UserId,
        id: FeedbackId,
        content: FeedbackContent,
    ) -> Result<Feedback, Error> {
        let user = self.require_user(user_id).await?;
        let mut feedback = self.require_feedback(id).await?;
        if !feedback.is_editable_by(&user) {
            return Err(Error::forbidden("only the author or an administrator can edit feedback"));
        }
        feedback.edit(content, self.clock.utc());
        self.save(&feedback).await?;
        Ok(feedback)
    }

    async fn change_status(
        &self,
        user_id: &UserId,
        id: FeedbackId,
        status: FeedbackStatus,
    ) -> Result<Feedback, Error> {
        let user = self.require_user(user_id).await?;
        if !user.is_admin() {
            return Err(Error::forbidden("only administrators can change feedback status"));
        }
        let mut feedback = self.require_feedback(id).await?;
        feedback.change_status(status, self.clock.utc());
        self.save(&feedback).await?;
        info!(feedback_id = %id, status = status.as_str(), "feedback status changed");
        Ok(feedback)
    }
}

#[async_trait]
impl<F, U> FeedbackQuery for FeedbackService<F, U>
where
    F: FeedbackRepository,
    U: UserRepository,
{
    async fn list(&self) -> Result<Vec<Feedback>, Error> {
        self.feedbacks.list_all().await.map_err(map_repository_error)
    }

    async fn get(&self, id: FeedbackId) -> Result<Feedback, Error> {
        self.require_feedback(id).await
    }
}
