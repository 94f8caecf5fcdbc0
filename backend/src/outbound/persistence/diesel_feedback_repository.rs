//! PostgreSQL-backed `FeedbackRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{Feedback, FeedbackId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::FeedbackRow;
use super::pool::{DbPool, PoolError};
use super::schema::feedbacks;

#[derive(Clone)]
pub struct DieselFeedbackRepository {
    pool: DbPool,
}

impl DieselFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FeedbackRepositoryError {
    map_basic_pool_error(error, FeedbackRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> FeedbackRepositoryError {
    map_basic_diesel_error(
        error,
        FeedbackRepositoryError::query,
        FeedbackRepositoryError::connection,
    )
}

#[async_trait]
impl FeedbackRepository for DieselFeedbackRepository {
    async fn save(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError> {
        let row = FeedbackRow::from_feedback(feedback);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(feedbacks::table)
            .values(&row)
            .on_conflict(feedbacks::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &FeedbackId,
    ) -> Result<Option<Feedback>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<FeedbackRow> = feedbacks::table
            .filter(feedbacks::id.eq(id.as_uuid()))
            .select(FeedbackRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_feedback().map_err(FeedbackRepositoryError::query))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FeedbackRow> = feedbacks::table
            .select(FeedbackRow::as_select())
            .order_by(feedbacks::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row.into_feedback().map_err(FeedbackRepositoryError::query))
            .collect()
    }
}
