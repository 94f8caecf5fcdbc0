//! Reference domain service implementing the reference driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::itinerary_service::require_itinerary;
use crate::domain::ports::{
    ItineraryRepository, ReferenceCommand, ReferenceQuery, ReferenceRepository,
    ReferenceRepositoryError,
};
use crate::domain::{
    Error, Itinerary, ItineraryId, Reference, ReferenceEntry, ReferenceError, ReferenceId,
    ReferenceSummary, UserId,
};

fn map_repository_error(error: ReferenceRepositoryError) -> Error {
    match error {
        ReferenceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("reference repository unavailable: {message}"))
        }
        ReferenceRepositoryError::Query { message } => {
            Error::internal(format!("reference repository error: {message}"))
        }
        ReferenceRepositoryError::Duplicate { .. } => already_referenced(),
    }
}

fn already_referenced() -> Error {
    Error::conflict("you already wrote a reference for this itinerary")
}

fn map_reference_error(error: ReferenceError) -> Error {
    Error::forbidden(error.to_string())
}

fn reference_not_found(id: ReferenceId) -> Error {
    Error::not_found(format!("reference {id} not found"))
}

#[derive(Clone)]
pub struct ReferenceService<R, I> {
    references: Arc<R>,
    itineraries: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<R, I> ReferenceService<R, I> {
    pub fn new(references: Arc<R>, itineraries: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            references,
            itineraries,
            clock,
        }
    }
}

impl<R, I> ReferenceService<R, I>
where
    R: ReferenceRepository,
    I: ItineraryRepository,
{
    async fn find(&self, id: ReferenceId) -> Result<Reference, Error> {
        self.references
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| reference_not_found(id))
    }

    async fn save(&self, reference: &Reference) -> Result<(), Error> {
        self.references
            .save(reference)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R, I> ReferenceCommand for ReferenceService<R, I>
where
    R: ReferenceRepository,
    I: ItineraryRepository,
{
    async fn write(
        &self,
        author_id: &UserId,
        itinerary_id: ItineraryId,
        entry: ReferenceEntry,
    ) -> Result<Reference, Error> {
        let itinerary = self.prepare(author_id, itinerary_id).await?;
        let reference = Reference::write(author_id.clone(), &itinerary, entry, self.clock.utc())
            .map_err(map_reference_error)?;
        self.save(&reference).await?;
        info!(
            reference_id = %reference.id(),
            %itinerary_id,
            recipient_id = %reference.recipient_id(),
            "reference written"
        );
        Ok(reference)
    }

    async fn answer(
        &self,
        user_id: &UserId,
        id: ReferenceId,
        entry: ReferenceEntry,
    ) -> Result<Reference, Error> {
        let mut reference = self.find(id).await?;
        if !reference.is_visible_to(user_id) {
            return Err(reference_not_found(id));
        }
        reference
            .answer(user_id, entry, self.clock.utc())
            .map_err(map_reference_error)?;
        self.save(&reference).await?;
        info!(reference_id = %id, "reference answered");
        Ok(reference)
    }
}

#[async_trait]
impl<R, I> ReferenceQuery for ReferenceService<R, I>
where
    R: ReferenceRepository,
    I: ItineraryRepository,
{
    async fn list_received(&self, user_id: &UserId) -> Result<Vec<Reference>, Error> {
        self.references
            .list_received(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn get(&self, viewer_id: &UserId, id: ReferenceId) -> Result<Reference, Error> {
        let reference = self.find(id).await?;
        if !reference.is_visible_to(viewer_id) {
            return Err(reference_not_found(id));
        }
        Ok(reference)
    }

    async fn prepare(
        &self,
        author_id: &UserId,
        itinerary_id: ItineraryId,
    ) -> Result<Itinerary, Error> {
        let itinerary = require_itinerary(self.itineraries.as_ref(), &itinerary_id).await?;
        if itinerary.is_driven_by(author_id) {
            return Err(map_reference_error(ReferenceError::OwnItinerary));
        }
        let existing = self
            .references
            .find_by_author_and_itinerary(author_id, &itinerary_id)
            .await
            .map_err(map_repository_error)?;
        if let Some(existing) = existing {
            return Err(already_referenced().with_details(json!({ "referenceId": existing.id() })));
        }
        Ok(itinerary)
    }

    async fn summary(&self, user_id: &UserId) -> Result<ReferenceSummary, Error> {
        let references = self.list_received(user_id).await?;
        Ok(references.iter().collect())
    }
}
