//! PostgreSQL-backed `ReferenceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReferenceRepository, ReferenceRepositoryError};
use crate::domain::{ItineraryId, Reference, ReferenceId, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::ReferenceRow;
use super::pool::{DbPool, PoolError};
use super::schema::user_references;

/// Diesel-backed implementation of the `ReferenceRepository` port.
///
/// The `(author_id, itinerary_id)` unique constraint surfaces as
/// [`ReferenceRepositoryError::Duplicate`].
#[derive(Clone)]
pub struct DieselReferenceRepository {
    pool: DbPool,
}

impl DieselReferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReferenceRepositoryError {
    map_basic_pool_error(error, ReferenceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReferenceRepositoryError {
    if is_unique_violation(&error) {
        return ReferenceRepositoryError::duplicate("author already referenced this itinerary");
    }
    map_basic_diesel_error(
        error,
        ReferenceRepositoryError::query,
        ReferenceRepositoryError::connection,
    )
}

fn row_to_reference(row: ReferenceRow) -> Result<Reference, ReferenceRepositoryError> {
    row.into_reference().map_err(ReferenceRepositoryError::query)
}

#[async_trait]
impl ReferenceRepository for DieselReferenceRepository {
    async fn save(&self, reference: &Reference) -> Result<(), ReferenceRepositoryError> {
        let row = ReferenceRow::from_reference(reference);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(user_references::table)
            .values(&row)
            .on_conflict(user_references::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &ReferenceId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ReferenceRow> = user_references::table
            .filter(user_references::id.eq(id.as_uuid()))
            .select(ReferenceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_reference).transpose()
    }

    async fn find_by_author_and_itinerary(
        &self,
        author_id: &UserId,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ReferenceRow> = user_references::table
            .filter(user_references::author_id.eq(author_id.as_uuid()))
            .filter(user_references::itinerary_id.eq(itinerary_id.as_uuid()))
            .select(ReferenceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_reference).transpose()
    }

    async fn list_received(
        &self,
        recipient_id: &UserId,
    ) -> Result<Vec<Reference>, ReferenceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReferenceRow> = user_references::table
            .filter(user_references::recipient_id.eq(recipient_id.as_uuid()))
            .select(ReferenceRow::as_select())
            .order_by(user_references::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_reference).collect()
    }
}
