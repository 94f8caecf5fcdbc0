//! Driving port for itinerary mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, Itinerary, ItineraryId, Place, UserId};

/// Fields supplied by a driver offering a ride.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItinerary {
    pub title: String,
    pub description: String,
    pub start: Place,
    pub end: Place,
    pub leave_date: DateTime<Utc>,
    pub round_trip: bool,
    pub return_date: Option<DateTime<Utc>>,
    pub daily: bool,
    pub num_people: u8,
    pub fuel_cost: u32,
    pub tolls: u32,
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub pink: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryCommand: Send + Sync {
    /// Validate and store a new itinerary driven by `driver_id`.
    async fn publish(&self, driver_id: &UserId, itinerary: NewItinerary)
    -> Result<Itinerary, Error>;

    /// Remove an itinerary; only its driver may do so.
    async fn remove(&self, user_id: &UserId, id: ItineraryId) -> Result<(), Error>;
}
