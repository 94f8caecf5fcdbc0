//! User lookup service implementing [`UsersQuery`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{UserRepository, UsersQuery};
use crate::domain::sign_in_service::map_user_repository_error;
use crate::domain::{Error, User, UserId};

#[derive(Clone)]
pub struct UsersService<U> {
    users: Arc<U>,
}

impl<U> UsersService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> UsersQuery for UsersService<U>
where
    U: UserRepository,
{
    async fn find_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.users
            .find_many(ids)
            .await
            .map_err(map_user_repository_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockUserRepository, UserPersistenceError};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).return_once(|_| Ok(None));
        let error = UsersService::new(Arc::new(repo))
            .find_user(&UserId::random())
            .await
            .expect_err("not found");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn query_failures_are_internal() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .return_once(|_| Err(UserPersistenceError::query("syntax error")));
        let error = UsersService::new(Arc::new(repo))
            .find_user(&UserId::random())
            .await
            .expect_err("internal");
        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_lookups_skip_the_repository() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_many().times(0);
        let users = UsersService::new(Arc::new(repo))
            .find_users(&[])
            .await
            .expect("empty lookup");
        assert!(users.is_empty());
    }
}
