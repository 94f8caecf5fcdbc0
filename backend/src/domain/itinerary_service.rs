//! Itinerary domain service implementing the itinerary driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    ItineraryCommand, ItineraryQuery, ItineraryRepository, ItineraryRepositoryError,
    NewItinerary,
};
use crate::domain::{
    Error, GeoBounds, Itinerary, ItineraryDraft, ItineraryId, ItinerarySearch,
    ItineraryValidationError, UserId,
};

pub(crate) fn map_itinerary_repository_error(error: ItineraryRepositoryError) -> Error {
    match error {
        ItineraryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("itinerary repository unavailable: {message}"))
        }
        ItineraryRepositoryError::Query { message } => {
            Error::internal(format!("itinerary repository error: {message}"))
        }
    }
}

fn map_validation_error(error: ItineraryValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": error.field() }))
}

/// Load an itinerary or fail with `not_found`.
pub(crate) async fn require_itinerary<I>(repo: &I, id: &ItineraryId) -> Result<Itinerary, Error>
where
    I: ItineraryRepository + ?Sized,
{
    repo.find_by_id(id)
        .await
        .map_err(map_itinerary_repository_error)?
        .ok_or_else(|| Error::not_found(format!("itinerary {id} not found")))
}

#[derive(Clone)]
pub struct ItineraryService<I> {
    itineraries: Arc<I>,
    clock: Arc<dyn Clock>,
    restriction: Option<GeoBounds>,
}

impl<I> ItineraryService<I> {
    /// Build the service; `restriction` confines new itineraries to an area.
    pub fn new(itineraries: Arc<I>, clock: Arc<dyn Clock>, restriction: Option<GeoBounds>) -> Self {
        Self {
            itineraries,
            clock,
            restriction,
        }
    }
}

#[async_trait]
impl<I> ItineraryCommand for ItineraryService<I>
where
    I: ItineraryRepository,
{
    async fn publish(
        &self,
        driver_id: &UserId,
        itinerary: NewItinerary,
    ) -> Result<Itinerary, Error> {
        let now = self.clock.utc();
        let draft = ItineraryDraft {
            id: ItineraryId::random(),
            driver_id: driver_id.clone(),
            title: itinerary.title,
            description: itinerary.description,
            start: itinerary.start,
            end: itinerary.end,
            leave_date: itinerary.leave_date,
            round_trip: itinerary.round_trip,
            return_date: itinerary.return_date,
            daily: itinerary.daily,
            num_people: itinerary.num_people,
            fuel_cost: itinerary.fuel_cost,
            tolls: itinerary.tolls,
            smoking_allowed: itinerary.smoking_allowed,
            pets_allowed: itinerary.pets_allowed,
            pink: itinerary.pink,
            created_at: now,
            updated_at: now,
        };
        let itinerary = Itinerary::publish(draft, now, self.restriction.as_ref())
            .map_err(map_validation_error)?;
        self.itineraries
            .save(&itinerary)
            .await
            .map_err(map_itinerary_repository_error)?;
        info!(itinerary_id = %itinerary.id(), %driver_id, "itinerary published");
        Ok(itinerary)
    }

    async fn remove(&self, user_id: &UserId, id: ItineraryId) -> Result<(), Error> {
        let itinerary = require_itinerary(self.itineraries.as_ref(), &id).await?;
        if !itinerary.is_driven_by(user_id) {
            return Err(Error::forbidden("only the driver can delete an itinerary"));
        }
        self.itineraries
            .delete(&id)
            .await
            .map_err(map_itinerary_repository_error)?;
        info!(itinerary_id = %id, "itinerary deleted");
        Ok(())
    }
}

#[async_trait]
impl<I> ItineraryQuery for ItineraryService<I>
where
    I: ItineraryRepository,
{
    async fn get(&self, id: ItineraryId) -> Result<Itinerary, Error> {
        require_itinerary(self.itineraries.as_ref(), &id).await
    }

    async fn list_for_driver(&self, driver_id: &UserId) -> Result<Vec<Itinerary>, Error> {
        self.itineraries
            .list_by_driver(driver_id)
            .await
            .map_err(map_itinerary_repository_error)
    }

    async fn search(&self, search: ItinerarySearch) -> Result<Vec<Itinerary>, Error> {
        self.itineraries
            .search(&search, self.clock.utc())
            .await
            .map_err(map_itinerary_repository_error)
    }
}

#[cfg(test)]
#[path = "itinerary_service_tests.rs"]
mod tests;
