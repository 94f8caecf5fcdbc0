//! Background job caching provider data (friends count, likes) on users.
//!
//! Runs out of band after sign-in. Every failure is logged and the job is
//! dropped; the next sign-in schedules a new attempt.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{CacheProviderDataJob, JobHandler, OAuthProvider, UserRepository};

/// Job handler refreshing the cached provider data of one user.
#[derive(Clone)]
pub struct ProviderDataCacher<U, P: ?Sized> {
    users: Arc<U>,
    provider: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<U, P: ?Sized> ProviderDataCacher<U, P> {
    pub fn new(users: Arc<U>, provider: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            provider,
            clock,
        }
    }
}

#[async_trait]
impl<U, P> JobHandler for ProviderDataCacher<U, P>
where
    U: UserRepository,
    P: OAuthProvider + ?Sized,
{
    async fn handle(&self, job: CacheProviderDataJob) {
        let user_id = job.user_id;
        let user = match self.users.find_by_id(&user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(%user_id, "provider data job skipped: user not found");
                return;
            }
            Err(error) => {
                warn!(%user_id, %error, "provider data job failed to load user");
                return;
            }
        };

        let now = self.clock.utc();
        let Some(token) = user.usable_access_token(now).cloned() else {
            warn!(%user_id, "provider data job skipped: no usable access token");
            return;
        };

        let data = match self.provider.fetch_provider_data(&token).await {
            Ok(data) => data,
            Err(error) => {
                warn!(%user_id, %error, "provider data fetch failed");
                return;
            }
        };

        // The user may have been banned or signed in again during the fetch;
        // only the cache columns are written back.
        match self
            .users
            .store_provider_data(&user_id, &data, now)
            .await
        {
            Ok(true) => info!(%user_id, friends_count = data.friends_count, "provider data cached"),
            Ok(false) => warn!(%user_id, "provider data dropped: user deleted during the job"),
            Err(error) => warn!(%user_id, %error, "failed to store provider data"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Job outcomes: cached data, expired tokens, provider failures, unknown users.
    use super::*;
    use crate::domain::ports::{MockOAuthProvider, MockUserRepository, OAuthProviderError};
    use crate::domain::{
        AccessToken, AuthProvider, AuthorizationCode, DisplayName, OAuthIdentity, OAuthState,
        ProviderCredentials, ProviderData, ProviderLike, ProviderUid, User, UserId,
    };
    use crate::outbound::memory::MemoryUserRepository;
    use crate::test_support::{FixtureClock, fixture_timestamp};
    use chrono::Duration;
    use url::Url;
    use mockall::predicate::function;
    use rstest::rstest;

    fn user_with_token(expires_in: Duration) -> User {
        User::from_identity(
            &OAuthIdentity {
                provider: AuthProvider::Facebook,
                uid: ProviderUid::new("42").expect("uid"),
                name: DisplayName::new("Linus").expect("name"),
                email: None,
                image: None,
                gender: None,
                locale: None,
                birthday: None,
                link: None,
                credentials: ProviderCredentials {
                    token: AccessToken::new("stored-token"),
                    expires_at: Some(fixture_timestamp() + expires_in),
                },
            },
            fixture_timestamp() - Duration::days(1),
        )
    }

    fn cacher(
        users: MockUserRepository,
        provider: MockOAuthProvider,
    ) -> ProviderDataCacher<MockUserRepository, MockOAuthProvider> {
        ProviderDataCacher::new(
            Arc::new(users),
            Arc::new(provider),
            Arc::new(FixtureClock::new(fixture_timestamp())),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn caches_friends_and_likes() {
        let user = user_with_token(Duration::days(10));
        let user_id = user.id().clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        let expected_id = user_id.clone();
        users
            .expect_store_provider_data()
            .withf(move |id, data, cached_at| {
                *id == expected_id && data.friends_count == 7 && *cached_at == fixture_timestamp()
            })
            .times(1)
            .returning(|_, _, _| Ok(true));
        users.expect_save().times(0);
        let mut provider = MockOAuthProvider::new();
        provider
            .expect_fetch_provider_data()
            .with(function(|token: &AccessToken| token.expose() == "stored-token"))
            .times(1)
            .returning(|_| {
                Ok(ProviderData {
                    friends_count: 7,
                    likes: Vec::new(),
                })
            });

        cacher(users, provider)
            .handle(CacheProviderDataJob { user_id })
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn expired_token_skips_the_provider() {
        let user = user_with_token(Duration::days(-1));
        let user_id = user.id().clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        users.expect_store_provider_data().times(0);
        let mut provider = MockOAuthProvider::new();
        provider.expect_fetch_provider_data().times(0);

        cacher(users, provider)
            .handle(CacheProviderDataJob { user_id })
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn provider_failure_leaves_user_untouched() {
        let user = user_with_token(Duration::days(10));
        let user_id = user.id().clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        users.expect_store_provider_data().times(0);
        let mut provider = MockOAuthProvider::new();
        provider
            .expect_fetch_provider_data()
            .times(1)
            .returning(|_| Err(OAuthProviderError::rejected("token revoked")));

        cacher(users, provider)
            .handle(CacheProviderDataJob { user_id })
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_user_is_skipped() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(1).return_once(|_| Ok(None));
        users.expect_store_provider_data().times(0);
        let mut provider = MockOAuthProvider::new();
        provider.expect_fetch_provider_data().times(0);

        cacher(users, provider)
            .handle(CacheProviderDataJob {
                user_id: UserId::random(),
            })
            .await;
    }

    /// Provider whose fetch races with an admin banning the user.
    struct BanningProvider {
        users: Arc<MemoryUserRepository>,
        user_id: UserId,
    }

    #[async_trait]
    impl OAuthProvider for BanningProvider {
        fn provider(&self) -> AuthProvider {
            AuthProvider::Facebook
        }

        fn authorize_url(&self, _state: &OAuthState) -> Result<Url, OAuthProviderError> {
            Err(OAuthProviderError::rejected("not used"))
        }

        async fn exchange_code(
            &self,
            _code: &AuthorizationCode,
        ) -> Result<OAuthIdentity, OAuthProviderError> {
            Err(OAuthProviderError::rejected("not used"))
        }

        async fn fetch_provider_data(
            &self,
            _token: &AccessToken,
        ) -> Result<ProviderData, OAuthProviderError> {
            let mut user = self
                .users
                .find_by_id(&self.user_id)
                .await
                .expect("lookup")
                .expect("user");
            user.set_banned(true, fixture_timestamp());
            self.users.save(&user).await.expect("ban");
            Ok(ProviderData {
                friends_count: 3,
                likes: vec![ProviderLike {
                    id: "1".into(),
                    name: "Cycling".into(),
                }],
            })
        }
    }

    #[rstest]
    #[tokio::test]
    async fn ban_issued_during_fetch_survives_the_job() {
        let user = user_with_token(Duration::days(10));
        let user_id = user.id().clone();
        let users = Arc::new(MemoryUserRepository::new());
        users.save(&user).await.expect("seed");
        let provider = Arc::new(BanningProvider {
            users: users.clone(),
            user_id: user_id.clone(),
        });

        ProviderDataCacher::new(
            users.clone(),
            provider,
            Arc::new(FixtureClock::new(fixture_timestamp())),
        )
        .handle(CacheProviderDataJob {
            user_id: user_id.clone(),
        })
        .await;

        let stored = users
            .find_by_id(&user_id)
            .await
            .expect("lookup")
            .expect("user");
        assert!(stored.is_banned());
        assert_eq!(stored.provider_data().friends_count, Some(3));
        assert_eq!(stored.provider_data().likes.len(), 1);
        assert_eq!(stored.provider_data().cached_at, Some(fixture_timestamp()));
    }
}
