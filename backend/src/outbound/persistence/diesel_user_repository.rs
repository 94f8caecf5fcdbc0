//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AuthProvider, ProviderData, ProviderUid, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// `save` is an upsert keyed on the primary key; the `(provider, uid)` unique
/// constraint rejects a second user for the same provider identity.
/// `store_provider_data` is a narrow `UPDATE` of the cache columns only.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let id = row.id;
    row.into_user().map_err(|message| {
        tracing::warn!(user_id = %id, %message, "stored user failed validation");
        UserPersistenceError::query(message)
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn save(&self, user: &User) -> Result<(), UserPersistenceError> {
        let row = UserRow::from_user(user).map_err(UserPersistenceError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::display_name.eq(excluded(users::display_name)),
                users::email.eq(excluded(users::email)),
                users::image.eq(excluded(users::image)),
                users::gender.eq(excluded(users::gender)),
                users::locale.eq(excluded(users::locale)),
                users::birthday.eq(excluded(users::birthday)),
                users::profile_link.eq(excluded(users::profile_link)),
                users::access_token.eq(excluded(users::access_token)),
                users::access_token_expires_at.eq(excluded(users::access_token_expires_at)),
                users::admin.eq(excluded(users::admin)),
                users::banned.eq(excluded(users::banned)),
                users::friends_count.eq(excluded(users::friends_count)),
                users::likes.eq(excluded(users::likes)),
                users::provider_data_cached_at.eq(excluded(users::provider_data_cached_at)),
                users::updated_at.eq(excluded(users::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn store_provider_data(
        &self,
        id: &UserId,
        data: &ProviderData,
        cached_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError> {
        let friends_count = i32::try_from(data.friends_count).map_err(|err| {
            UserPersistenceError::query(format!("friends count out of range: {err}"))
        })?;
        let likes = serde_json::to_value(&data.likes).map_err(|err| {
            UserPersistenceError::query(format!("likes did not serialise: {err}"))
        })?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::friends_count.eq(Some(friends_count)),
                users::likes.eq(likes),
                users::provider_data_cached_at.eq(Some(cached_at)),
                users::updated_at.eq(cached_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_provider_uid(
        &self,
        provider: AuthProvider,
        uid: &ProviderUid,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::provider.eq(provider.as_str()))
            .filter(users::uid.eq(uid.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(&uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }
}
