//! Driving port for itinerary reads.

use async_trait::async_trait;

use crate::domain::{Error, Itinerary, ItineraryId, ItinerarySearch, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryQuery: Send + Sync {
    async fn get(&self, id: ItineraryId) -> Result<Itinerary, Error>;

    /// Itineraries of one driver, newest first.
    async fn list_for_driver(&self, driver_id: &UserId) -> Result<Vec<Itinerary>, Error>;

    /// Upcoming itineraries matching a geographic search.
    async fn search(&self, search: ItinerarySearch) -> Result<Vec<Itinerary>, Error>;
}
