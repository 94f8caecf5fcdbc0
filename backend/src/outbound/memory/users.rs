//! In-memory `UserRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AuthProvider, ProviderData, ProviderUid, User, UserId};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn save(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.users.write().await;
        let clash = users.values().any(|existing| {
            existing.id() != user.id()
                && existing.provider() == user.provider()
                && existing.uid() == user.uid()
        });
        if clash {
            return Err(UserPersistenceError::query(format!(
                "provider identity {} already belongs to another user",
                user.uid().as_ref()
            )));
        }
        users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn store_provider_data(
        &self,
        id: &UserId,
        data: &ProviderData,
        cached_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };
        user.cache_provider_data(data.clone(), cached_at);
        Ok(true)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_provider_uid(
        &self,
        provider: AuthProvider,
        uid: &ProviderUid,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.provider() == provider && user.uid() == uid)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{facebook_identity, fixture_timestamp};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn users_are_found_by_provider_identity() {
        let repo = MemoryUserRepository::new();
        let user = User::from_identity(&facebook_identity("42", "Grace"), fixture_timestamp());
        repo.save(&user).await.expect("save");

        let found = repo
            .find_by_provider_uid(AuthProvider::Facebook, user.uid())
            .await
            .expect("query")
            .expect("present");
        assert_eq!(found.id(), user.id());
    }

    #[rstest]
    #[tokio::test]
    async fn a_provider_identity_belongs_to_one_user() {
        let repo = MemoryUserRepository::new();
        let identity = facebook_identity("42", "Grace");
        repo.save(&User::from_identity(&identity, fixture_timestamp()))
            .await
            .expect("first");
        let err = repo
            .save(&User::from_identity(&identity, fixture_timestamp()))
            .await
            .expect_err("duplicate uid");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn storing_provider_data_keeps_the_other_fields() {
        let repo = MemoryUserRepository::new();
        let mut user = User::from_identity(&facebook_identity("42", "Grace"), fixture_timestamp());
        user.set_banned(true, fixture_timestamp());
        repo.save(&user).await.expect("save");

        let data = ProviderData {
            friends_count: 12,
            likes: Vec::new(),
        };
        assert!(
            repo.store_provider_data(user.id(), &data, fixture_timestamp())
                .await
                .expect("store")
        );
        assert!(
            !repo
                .store_provider_data(&UserId::random(), &data, fixture_timestamp())
                .await
                .expect("store")
        );

        let stored = repo.find_by_id(user.id()).await.expect("query").expect("present");
        assert!(stored.is_banned());
        assert_eq!(stored.provider_data().friends_count, Some(12));
    }
}
