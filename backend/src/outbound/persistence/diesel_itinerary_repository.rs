//! PostgreSQL-backed `ItineraryRepository` implementation using Diesel ORM.
//!
//! Search narrows candidates in SQL (departure time, boolean flags and a
//! bounding box around both endpoints) and applies the great-circle radius
//! check in Rust via [`ItinerarySearch::matches`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ItineraryRepository, ItineraryRepositoryError};
use crate::domain::{GeoBounds, Itinerary, ItineraryId, ItinerarySearch, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ItineraryRow;
use super::pool::{DbPool, PoolError};
use super::schema::itineraries;

/// Restrict a boxed itinerary query to endpoints inside `$bounds`.
macro_rules! filter_within {
    ($query:ident, $lat:expr, $lng:expr, $bounds:expr) => {{
        let bounds: GeoBounds = $bounds;
        $query = $query.filter($lat.between(bounds.sw().lat(), bounds.ne().lat()));
        $query = if bounds.sw().lng() <= bounds.ne().lng() {
            $query.filter($lng.between(bounds.sw().lng(), bounds.ne().lng()))
        } else {
            $query.filter($lng.ge(bounds.sw().lng()).or($lng.le(bounds.ne().lng())))
        };
    }};
}

#[derive(Clone)]
pub struct DieselItineraryRepository {
    pool: DbPool,
}

impl DieselItineraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItineraryRepositoryError {
    map_basic_pool_error(error, ItineraryRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ItineraryRepositoryError {
    map_basic_diesel_error(
        error,
        ItineraryRepositoryError::query,
        ItineraryRepositoryError::connection,
    )
}

fn rows_to_itineraries(rows: Vec<ItineraryRow>) -> Result<Vec<Itinerary>, ItineraryRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_itinerary().map_err(ItineraryRepositoryError::query))
        .collect()
}

#[async_trait]
impl ItineraryRepository for DieselItineraryRepository {
    async fn save(&self, itinerary: &Itinerary) -> Result<(), ItineraryRepositoryError> {
        let row = ItineraryRow::from_itinerary(itinerary).map_err(ItineraryRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(itineraries::table)
            .values(&row)
            .on_conflict(itineraries::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &ItineraryId,
    ) -> Result<Option<Itinerary>, ItineraryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ItineraryRow> = itineraries::table
            .filter(itineraries::id.eq(id.as_uuid()))
            .select(ItineraryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_itinerary().map_err(ItineraryRepositoryError::query))
            .transpose()
    }

    async fn list_by_driver(
        &self,
        driver_id: &UserId,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ItineraryRow> = itineraries::table
            .filter(itineraries::driver_id.eq(driver_id.as_uuid()))
            .select(ItineraryRow::as_select())
            .order_by(itineraries::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_itineraries(rows)
    }

    async fn search(
        &self,
        search: &ItinerarySearch,
        after: DateTime<Utc>,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = itineraries::table
            .filter(itineraries::leave_date.gt(after))
            .select(ItineraryRow::as_select())
            .order_by(itineraries::leave_date.asc())
            .into_boxed();
        if let Some(pink) = search.pink {
            query = query.filter(itineraries::pink.eq(pink));
        }
        if let Some(smoking) = search.smoking_allowed {
            query = query.filter(itineraries::smoking_allowed.eq(smoking));
        }
        if let Some(pets) = search.pets_allowed {
            query = query.filter(itineraries::pets_allowed.eq(pets));
        }
        filter_within!(
            query,
            itineraries::start_lat,
            itineraries::start_lng,
            search.start.bounds_within(search.radius_km)
        );
        filter_within!(
            query,
            itineraries::end_lat,
            itineraries::end_lng,
            search.end.bounds_within(search.radius_km)
        );

        let rows: Vec<ItineraryRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        Ok(rows_to_itineraries(rows)?
            .into_iter()
            .filter(|itinerary| search.matches(itinerary))
            .collect())
    }

    async fn delete(&self, id: &ItineraryId) -> Result<bool, ItineraryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(itineraries::table.filter(itineraries::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
