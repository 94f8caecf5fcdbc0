//! Port for reference persistence.

use async_trait::async_trait;

use crate::domain::{ItineraryId, Reference, ReferenceId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reference repository adapters.
    pub enum ReferenceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "reference repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "reference repository query failed: {message}",
        /// The author already referenced this itinerary.
        Duplicate { message: String } => "reference already exists: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Insert or update a reference.
    async fn save(&self, reference: &Reference) -> Result<(), ReferenceRepositoryError>;

    async fn find_by_id(
        &self,
        id: &ReferenceId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError>;

    async fn find_by_author_and_itinerary(
        &self,
        author_id: &UserId,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError>;

    /// References received by `recipient_id`, newest first.
    async fn list_received(
        &self,
        recipient_id: &UserId,
    ) -> Result<Vec<Reference>, ReferenceRepositoryError>;
}
