//! In-memory `ReferenceRepository`.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{ReferenceRepository, ReferenceRepositoryError};
use crate::domain::{ItineraryId, Reference, ReferenceId, UserId};

/// Enforces one reference per author and itinerary, like the
/// `user_references` unique index.
#[derive(Debug, Default)]
pub struct MemoryReferenceRepository {
    references: RwLock<HashMap<ReferenceId, Reference>>,
}

impl MemoryReferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferenceRepository for MemoryReferenceRepository {
    async fn save(&self, reference: &Reference) -> Result<(), ReferenceRepositoryError> {
        let mut references = self.references.write().await;
        let duplicate = references.values().any(|existing| {
            existing.id() != reference.id()
                && existing.author_id() == reference.author_id()
                && existing.itinerary_id() == reference.itinerary_id()
        });
        if duplicate {
            return Err(ReferenceRepositoryError::duplicate(format!(
                "author {} already referenced itinerary {}",
                reference.author_id(),
                reference.itinerary_id()
            )));
        }
        references.insert(reference.id(), reference.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ReferenceId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError> {
        Ok(self.references.read().await.get(id).cloned())
    }

    async fn find_by_author_and_itinerary(
        &self,
        author_id: &UserId,
        itinerary_id: &ItineraryId,
    ) -> Result<Option<Reference>, ReferenceRepositoryError> {
        Ok(self
            .references
            .read()
            .await
            .values()
            .find(|reference| {
                reference.author_id() == author_id && reference.itinerary_id() == *itinerary_id
            })
            .cloned())
    }

    async fn list_received(
        &self,
        recipient_id: &UserId,
    ) -> Result<Vec<Reference>, ReferenceRepositoryError> {
        let mut found: Vec<Reference> = self
            .references
            .read()
            .await
            .values()
            .filter(|reference| reference.recipient_id() == recipient_id)
            .cloned()
            .collect();
        found.sort_by_key(|reference| Reverse(reference.created_at()));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Rating, ReferenceBody, ReferenceEntry};
    use crate::test_support::{fixture_timestamp, itinerary_driven_by};
    use rstest::rstest;

    fn entry() -> ReferenceEntry {
        ReferenceEntry {
            rating: Rating::Positive,
            body: ReferenceBody::new("On time and friendly").expect("body"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn second_reference_for_the_same_ride_is_a_duplicate() {
        let repo = MemoryReferenceRepository::new();
        let author = UserId::random();
        let itinerary = itinerary_driven_by(&UserId::random());
        let first = Reference::write(author.clone(), &itinerary, entry(), fixture_timestamp())
            .expect("write");
        let second =
            Reference::write(author, &itinerary, entry(), fixture_timestamp()).expect("write");

        repo.save(&first).await.expect("first save");
        let err = repo.save(&second).await.expect_err("duplicate");
        assert!(matches!(err, ReferenceRepositoryError::Duplicate { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn received_references_belong_to_the_driver() {
        let repo = MemoryReferenceRepository::new();
        let driver = UserId::random();
        let reference = Reference::write(
            UserId::random(),
            &itinerary_driven_by(&driver),
            entry(),
            fixture_timestamp(),
        )
        .expect("write");
        repo.save(&reference).await.expect("save");

        assert_eq!(repo.list_received(&driver).await.expect("list").len(), 1);
        assert!(
            repo.list_received(&UserId::random())
                .await
                .expect("list")
                .is_empty()
        );
    }
}
