//! Driving port for reference reads.

use async_trait::async_trait;

use crate::domain::{
    Error, Itinerary, ItineraryId, Reference, ReferenceId, ReferenceSummary, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceQuery: Send + Sync {
    /// References received by `user_id`, newest first.
    async fn list_received(&self, user_id: &UserId) -> Result<Vec<Reference>, Error>;

    /// One reference, visible to its author and recipient only.
    async fn get(&self, viewer_id: &UserId, id: ReferenceId) -> Result<Reference, Error>;

    /// Check that `author_id` may review `itinerary_id` and return it.
    async fn prepare(&self, author_id: &UserId, itinerary_id: ItineraryId)
    -> Result<Itinerary, Error>;

    /// Ratings received by `user_id`.
    async fn summary(&self, user_id: &UserId) -> Result<ReferenceSummary, Error>;
}
