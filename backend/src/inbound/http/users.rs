//! Users API handlers.
//!
//! ```text
//! GET /api/v1/users/me
//! GET /api/v1/users/{id}
//! DELETE /api/v1/users/sign_out
//! GET /api/v1/flash
//! ```

use std::collections::HashMap;

use actix_web::{HttpResponse, delete, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, ReferenceSummary, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::session::{Flash, SessionContext};
use crate::inbound::http::state::HttpState;

/// Display name used when a referenced user no longer exists.
pub(crate) const UNKNOWN_USER_NAME: &str = "Unknown user";

/// Id, name and avatar of a user mentioned in another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl UserSummary {
    fn unknown(id: &UserId) -> Self {
        Self {
            id: id.to_string(),
            name: UNKNOWN_USER_NAME.to_owned(),
            image: None,
        }
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.display_name().to_string(),
            image: user.profile().image.clone(),
        }
    }
}

/// Users resolved in one batch for response rendering.
pub(crate) struct UserDirectory(HashMap<UserId, UserSummary>);

impl UserDirectory {
    /// Look up every id once; unknown ids render as [`UNKNOWN_USER_NAME`].
    pub(crate) async fn resolve<'a, I>(state: &HttpState, ids: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a UserId>,
    {
        let mut wanted: Vec<UserId> = ids.into_iter().cloned().collect();
        wanted.sort();
        wanted.dedup();
        let users = state.users.find_users(&wanted).await?;
        Ok(Self(
            users
                .iter()
                .map(|user| (user.id().clone(), UserSummary::from(user)))
                .collect(),
        ))
    }

    pub(crate) fn summary(&self, id: &UserId) -> UserSummary {
        self.0
            .get(id)
            .cloned()
            .unwrap_or_else(|| UserSummary::unknown(id))
    }

    pub(crate) fn name(&self, id: &UserId) -> String {
        self.0
            .get(id)
            .map_or_else(|| UNKNOWN_USER_NAME.to_owned(), |summary| summary.name.clone())
    }
}

/// Public profile of a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub gender: Option<String>,
    pub profile_link: Option<String>,
    pub friends_count: Option<u32>,
    pub likes: Vec<String>,
    pub references: ReferenceSummary,
    pub member_since: DateTime<Utc>,
}

/// The signed-in user's own profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub locale: Option<String>,
    pub admin: bool,
    pub unread_conversations: usize,
}

/// Pending flash message, if any.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlashResponse {
    pub flash: Option<Flash>,
}

/// Current user with the navbar unread badge.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let user = state.users.find_user(&user_id).await.map_err(|err| {
        if matches!(err.code(), crate::domain::ErrorCode::NotFound) {
            session.purge();
            Error::unauthorized("login required")
        } else {
            err
        }
    })?;
    let unread_conversations = state.conversations_query.unread_count(&user_id).await?;
    let profile = user.profile();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(CurrentUserResponse {
            id: user.id().to_string(),
            name: user.display_name().to_string(),
            email: profile.email.clone(),
            image: profile.image.clone(),
            locale: profile.locale.clone(),
            admin: user.is_admin(),
            unread_conversations,
        }))
}

/// Public profile with the received reference ratings.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<UserProfileResponse>> {
    session.require_user_id()?;
    let user_id = UserId::from_uuid(path.into_inner());
    let user = state.users.find_user(&user_id).await?;
    let references = state.references_query.summary(&user_id).await?;
    let profile = user.profile();
    let provider_data = user.provider_data();
    Ok(web::Json(UserProfileResponse {
        id: user.id().to_string(),
        name: user.display_name().to_string(),
        image: profile.image.clone(),
        gender: profile.gender.clone(),
        profile_link: profile.profile_link.clone(),
        friends_count: provider_data.friends_count,
        likes: provider_data
            .likes
            .iter()
            .map(|like| like.name.clone())
            .collect(),
        references,
        member_since: user.created_at(),
    }))
}

/// Drop the session.
#[utoipa::path(
    delete,
    path = "/api/v1/users/sign_out",
    responses((status = 204, description = "Signed out")),
    tags = ["users"],
    operation_id = "signOut",
    security([])
)]
#[delete("/users/sign_out")]
pub async fn sign_out(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Pop the flash message left by the last redirect.
#[utoipa::path(
    get,
    path = "/api/v1/flash",
    responses((status = 200, description = "Flash message", body = FlashResponse)),
    tags = ["users"],
    operation_id = "popFlash",
    security([])
)]
#[get("/flash")]
pub async fn pop_flash(session: SessionContext) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(FlashResponse {
            flash: session.take_flash(),
        })
}

#[cfg(test)]
mod tests;
