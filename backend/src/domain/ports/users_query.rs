//! Driving port for user lookups.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Fetch one user; `not_found` when unknown.
    async fn find_user(&self, id: &UserId) -> Result<User, Error>;

    /// Fetch several users for name resolution; unknown ids are skipped.
    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, Error>;
}
