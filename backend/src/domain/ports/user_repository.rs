//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AuthProvider, ProviderData, ProviderUid, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update a user record.
    async fn save(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Overwrite only the cached provider data of a user.
    ///
    /// Leaves every other column alone, so flags and tokens written while the
    /// data was being fetched survive. Returns `false` when the user is gone.
    async fn store_provider_data(
        &self,
        id: &UserId,
        data: &ProviderData,
        cached_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the user bound to a provider identity.
    async fn find_by_provider_uid(
        &self,
        provider: AuthProvider,
        uid: &ProviderUid,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch several users at once; unknown ids are skipped.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;
}
