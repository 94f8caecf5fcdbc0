//! Social sign-in service.
//!
//! Implements the OAuth callback flow: exchange the code for an identity,
//! find or create the matching user, refresh the cached profile and schedule
//! the provider-data refresh.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use url::Url;

use crate::domain::ports::{
    CacheProviderDataJob, JobQueue, OAuthProvider, OAuthProviderError, SignInCommand,
    UserPersistenceError, UserRepository,
};
use crate::domain::{AuthorizationCode, Error, OAuthIdentity, OAuthState, User};

pub(crate) fn map_user_repository_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn map_provider_error(error: OAuthProviderError) -> Error {
    match error {
        OAuthProviderError::Transport { message } => {
            Error::service_unavailable(format!("oauth provider unavailable: {message}"))
        }
        OAuthProviderError::Rejected { message } => {
            Error::unauthorized(format!("oauth provider refused sign in: {message}"))
        }
        OAuthProviderError::InvalidPayload { message } => {
            Error::internal(format!("oauth provider payload invalid: {message}"))
        }
    }
}

/// Sign-in service implementing [`SignInCommand`].
#[derive(Clone)]
pub struct SignInService<P: ?Sized, U, Q> {
    provider: Arc<P>,
    users: Arc<U>,
    queue: Arc<Q>,
    clock: Arc<dyn Clock>,
}

impl<P: ?Sized, U, Q> SignInService<P, U, Q> {
    pub fn new(provider: Arc<P>, users: Arc<U>, queue: Arc<Q>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            users,
            queue,
            clock,
        }
    }
}

impl<P, U, Q> SignInService<P, U, Q>
where
    P: OAuthProvider + ?Sized,
    U: UserRepository,
    Q: JobQueue,
{
    /// Find the user bound to the identity or build a new one.
    async fn from_omniauth(&self, identity: &OAuthIdentity) -> Result<User, Error> {
        let existing = self
            .users
            .find_by_provider_uid(identity.provider, &identity.uid)
            .await
            .map_err(map_user_repository_error)?;
        Ok(existing.unwrap_or_else(|| User::from_identity(identity, self.clock.utc())))
    }

    async fn enqueue_provider_data_refresh(&self, user: &User) {
        let job = CacheProviderDataJob {
            user_id: user.id().clone(),
        };
        if let Err(error) = self.queue.enqueue(job).await {
            warn!(user_id = %user.id(), %error, "failed to enqueue provider data refresh");
        }
    }
}

#[async_trait]
impl<P, U, Q> SignInCommand for SignInService<P, U, Q>
where
    P: OAuthProvider + ?Sized,
    U: UserRepository,
    Q: JobQueue,
{
    fn authorize_url(&self, state: &OAuthState) -> Result<Url, Error> {
        self.provider.authorize_url(state).map_err(map_provider_error)
    }

    async fn sign_in(&self, code: &AuthorizationCode) -> Result<User, Error> {
        let identity = self
            .provider
            .exchange_code(code)
            .await
            .map_err(map_provider_error)?;

        let mut user = self.from_omniauth(&identity).await?;
        if user.is_banned() {
            warn!(user_id = %user.id(), "banned user attempted to sign in");
            return Err(Error::forbidden("this account has been suspended"));
        }

        user.update_info_from_identity(&identity, self.clock.utc());
        self.users
            .save(&user)
            .await
            .map_err(map_user_repository_error)?;

        self.enqueue_provider_data_refresh(&user).await;
        info!(user_id = %user.id(), provider = %identity.provider, "user signed in");
        Ok(user)
    }
}

#[cfg(test)]
#[path = "sign_in_service_tests.rs"]
mod tests;
