//! In-memory `ItineraryRepository`.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{ItineraryRepository, ItineraryRepositoryError};
use crate::domain::{Itinerary, ItineraryId, ItinerarySearch, UserId};

#[derive(Debug, Default)]
pub struct MemoryItineraryRepository {
    itineraries: RwLock<HashMap<ItineraryId, Itinerary>>,
}

impl MemoryItineraryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItineraryRepository for MemoryItineraryRepository {
    async fn save(&self, itinerary: &Itinerary) -> Result<(), ItineraryRepositoryError> {
        self.itineraries
            .write()
            .await
            .insert(itinerary.id(), itinerary.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ItineraryId,
    ) -> Result<Option<Itinerary>, ItineraryRepositoryError> {
        Ok(self.itineraries.read().await.get(id).cloned())
    }

    async fn list_by_driver(
        &self,
        driver_id: &UserId,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError> {
        let mut found: Vec<Itinerary> = self
            .itineraries
            .read()
            .await
            .values()
            .filter(|itinerary| itinerary.is_driven_by(driver_id))
            .cloned()
            .collect();
        found.sort_by_key(|itinerary| Reverse(itinerary.created_at()));
        Ok(found)
    }

    async fn search(
        &self,
        search: &ItinerarySearch,
        after: DateTime<Utc>,
    ) -> Result<Vec<Itinerary>, ItineraryRepositoryError> {
        let mut found: Vec<Itinerary> = self
            .itineraries
            .read()
            .await
            .values()
            .filter(|itinerary| itinerary.leave_date() > after && search.matches(itinerary))
            .cloned()
            .collect();
        found.sort_by_key(Itinerary::leave_date);
        Ok(found)
    }

    async fn delete(&self, id: &ItineraryId) -> Result<bool, ItineraryRepositoryError> {
        Ok(self.itineraries.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_SEARCH_RADIUS_KM, LatLng};
    use crate::test_support::{fixture_timestamp, itinerary_driven_by};
    use chrono::Duration;
    use rstest::rstest;

    fn search_near_ischia() -> ItinerarySearch {
        ItinerarySearch {
            start: LatLng::new(40.74, 13.95).expect("start"),
            end: LatLng::new(40.84, 14.25).expect("end"),
            radius_km: DEFAULT_SEARCH_RADIUS_KM,
            pink: None,
            smoking_allowed: None,
            pets_allowed: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn search_skips_departed_rides() {
        let repo = MemoryItineraryRepository::new();
        let itinerary = itinerary_driven_by(&UserId::random());
        repo.save(&itinerary).await.expect("save");

        let upcoming = repo
            .search(&search_near_ischia(), fixture_timestamp())
            .await
            .expect("search");
        assert_eq!(upcoming.len(), 1);

        let later = itinerary.leave_date() + Duration::minutes(1);
        let departed = repo
            .search(&search_near_ischia(), later)
            .await
            .expect("search");
        assert!(departed.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn delete_reports_whether_the_row_existed() {
        let repo = MemoryItineraryRepository::new();
        let itinerary = itinerary_driven_by(&UserId::random());
        repo.save(&itinerary).await.expect("save");

        assert!(repo.delete(&itinerary.id()).await.expect("delete"));
        assert!(!repo.delete(&itinerary.id()).await.expect("delete again"));
    }
}
