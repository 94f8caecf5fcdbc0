//! Driving port for reference mutations.

use async_trait::async_trait;

use crate::domain::{Error, ItineraryId, Reference, ReferenceEntry, ReferenceId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceCommand: Send + Sync {
    /// Review the driver of `itinerary_id`.
    async fn write(
        &self,
        author_id: &UserId,
        itinerary_id: ItineraryId,
        entry: ReferenceEntry,
    ) -> Result<Reference, Error>;

    /// Store the recipient's answer.
    async fn answer(
        &self,
        user_id: &UserId,
        id: ReferenceId,
        entry: ReferenceEntry,
    ) -> Result<Reference, Error>;
}
