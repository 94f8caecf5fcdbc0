//! Port for itinerary persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Itinerary, ItineraryId, ItinerarySearch, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by itinerary repository adapters.
    pub enum ItineraryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "itinerary repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "itinerary repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    /// Insert or update an itinerary.
    async fn save(&self, itinerary: &Itinerary) -> Result<(), ItineraryRepositoryError>;

    async fn find_by_id(
        &self,
        id: &ItineraryId,
    ) -> Result<Option<Itinerary>, ItineraryRepositoryError>;

    /// Itineraries offered by `driver_id`, newest first.
    async fn list_by_driver(
        &self,
        driver_id: &UserId,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError>;

    /// Itineraries leaving after `after` that satisfy `search`, soonest first.
    async fn search(
        &self,
        search: &ItinerarySearch,
        after: DateTime<Utc>,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError>;

    /// Remove an itinerary; returns whether it existed.
    async fn delete(&self, id: &ItineraryId) -> Result<bool, ItineraryRepositoryError>;
}
