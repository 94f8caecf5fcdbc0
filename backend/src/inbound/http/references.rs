//! Reference HTTP handlers, nested under the signed-in user.
//!
//! ```text
//! GET /api/v1/users/{user_id}/references
//! GET /api/v1/users/{user_id}/references/new?itinerary_id=..
//! POST /api/v1/users/{user_id}/references?itinerary_id=..
//! GET /api/v1/users/{user_id}/references/{id}
//! PUT /api/v1/users/{user_id}/references/{id}
//! ```
//!
//! `{user_id}` must be the session user; anything else is `403`.

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Error, Rating, Reference, ReferenceBody, ReferenceEntry, ReferenceId, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::conversations::ItineraryParams;
use crate::inbound::http::itineraries::ItinerarySummary;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{UserDirectory, UserSummary};
use crate::inbound::http::validation::{FieldName, body_error, rating_error};

/// Body of `POST` and `PUT` requests.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReferenceRequest {
    pub reference: ReferenceFields,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReferenceFields {
    /// `-1`, `0` or `1`.
    pub rating: i16,
    pub body: String,
}

impl ReferenceRequest {
    fn into_entry(self) -> ApiResult<ReferenceEntry> {
        let ReferenceFields { rating, body } = self.reference;
        let rating = Rating::try_from(rating)
            .map_err(|err| rating_error(FieldName::new("reference.rating"), err))?;
        let body = ReferenceBody::new(body)
            .map_err(|err| body_error(FieldName::new("reference.body"), err))?;
        Ok(ReferenceEntry { rating, body })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferenceEntryResponse {
    pub rating: i16,
    pub body: String,
}

impl From<&ReferenceEntry> for ReferenceEntryResponse {
    fn from(entry: &ReferenceEntry) -> Self {
        Self {
            rating: entry.rating.value(),
            body: entry.body.as_ref().to_owned(),
        }
    }
}

/// A reference with its optional answer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub author: UserSummary,
    pub recipient: UserSummary,
    #[schema(format = "uuid")]
    pub itinerary_id: String,
    pub outgoing: ReferenceEntryResponse,
    pub incoming: Option<ReferenceEntryResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReferenceResponse {
    fn new(reference: &Reference, users: &UserDirectory) -> Self {
        Self {
            id: reference.id().to_string(),
            author: users.summary(reference.author_id()),
            recipient: users.summary(reference.recipient_id()),
            itinerary_id: reference.itinerary_id().to_string(),
            outgoing: reference.outgoing().into(),
            incoming: reference.incoming().map(Into::into),
            created_at: reference.created_at(),
            updated_at: reference.updated_at(),
        }
    }
}

/// Draft returned by `GET .../references/new`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferenceDraftResponse {
    pub itinerary: ItinerarySummary,
    pub recipient: UserSummary,
}

fn require_owner(session: &SessionContext, path_user: Uuid) -> ApiResult<UserId> {
    let user_id = session.require_user_id()?;
    if user_id.as_uuid() != &path_user {
        return Err(Error::forbidden("references belong to the signed-in user"));
    }
    Ok(user_id)
}

async fn render(state: &HttpState, references: &[Reference]) -> ApiResult<Vec<ReferenceResponse>> {
    let users = UserDirectory::resolve(
        state,
        references
            .iter()
            .flat_map(|reference| [reference.author_id(), reference.recipient_id()]),
    )
    .await?;
    Ok(references
        .iter()
        .map(|reference| ReferenceResponse::new(reference, &users))
        .collect())
}

async fn render_one(state: &HttpState, reference: Reference) -> ApiResult<ReferenceResponse> {
    render(state, std::slice::from_ref(&reference))
        .await?
        .pop()
        .ok_or_else(|| Error::internal("reference vanished while rendering"))
}

/// References the signed-in user has received.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/references",
    params(("user_id" = Uuid, Path, description = "Signed-in user id")),
    responses(
        (status = 200, description = "Received references", body = [ReferenceResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Another user's references", body = Error)
    ),
    tags = ["references"],
    operation_id = "listReferences"
)]
#[get("/users/{user_id}/references")]
pub async fn list_references(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = require_owner(&session, path.into_inner())?;
    let references = state.references_query.list_received(&user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(render(&state, &references).await?))
}

/// Prepare a reference about the driver of an itinerary.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/references/new",
    params(("user_id" = Uuid, Path, description = "Signed-in user id"), ItineraryParams),
    responses(
        (status = 200, description = "Draft", body = ReferenceDraftResponse),
        (status = 403, description = "Own itinerary or another user", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error),
        (status = 409, description = "Already referenced", body = Error)
    ),
    tags = ["references"],
    operation_id = "newReference"
)]
#[get("/users/{user_id}/references/new")]
pub async fn new_reference(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    params: web::Query<ItineraryParams>,
) -> ApiResult<web::Json<ReferenceDraftResponse>> {
    let user_id = require_owner(&session, path.into_inner())?;
    let itinerary_id = params.into_inner().itinerary_id()?;
    let itinerary = state.references_query.prepare(&user_id, itinerary_id).await?;
    let users = UserDirectory::resolve(&state, [itinerary.driver_id()]).await?;
    Ok(web::Json(ReferenceDraftResponse {
        recipient: users.summary(itinerary.driver_id()),
        itinerary: ItinerarySummary::from(&itinerary),
    }))
}

/// Review the driver of an itinerary.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/references",
    params(("user_id" = Uuid, Path, description = "Signed-in user id"), ItineraryParams),
    request_body = ReferenceRequest,
    responses(
        (status = 201, description = "Reference written", body = ReferenceResponse),
        (status = 400, description = "Invalid rating or body", body = Error),
        (status = 403, description = "Own itinerary or another user", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error),
        (status = 409, description = "Already referenced", body = Error)
    ),
    tags = ["references"],
    operation_id = "createReference"
)]
#[post("/users/{user_id}/references")]
pub async fn create_reference(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    params: web::Query<ItineraryParams>,
    payload: web::Json<ReferenceRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = require_owner(&session, path.into_inner())?;
    let itinerary_id = params.into_inner().itinerary_id()?;
    let entry = payload.into_inner().into_entry()?;
    let reference = state
        .references
        .write(&user_id, itinerary_id, entry)
        .await?;
    Ok(HttpResponse::Created().json(render_one(&state, reference).await?))
}

/// Read one reference; author and recipient only.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/references/{id}",
    params(
        ("user_id" = Uuid, Path, description = "Signed-in user id"),
        ("id" = Uuid, Path, description = "Reference id")
    ),
    responses(
        (status = 200, description = "Reference", body = ReferenceResponse),
        (status = 403, description = "Another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["references"],
    operation_id = "getReference"
)]
#[get("/users/{user_id}/references/{id}")]
pub async fn get_reference(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<web::Json<ReferenceResponse>> {
    let (path_user, id) = path.into_inner();
    let user_id = require_owner(&session, path_user)?;
    let reference = state
        .references_query
        .get(&user_id, ReferenceId::from_uuid(id))
        .await?;
    Ok(web::Json(render_one(&state, reference).await?))
}

/// Answer a received reference.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/references/{id}",
    params(
        ("user_id" = Uuid, Path, description = "Signed-in user id"),
        ("id" = Uuid, Path, description = "Reference id")
    ),
    request_body = ReferenceRequest,
    responses(
        (status = 200, description = "Reference with its answer", body = ReferenceResponse),
        (status = 400, description = "Invalid rating or body", body = Error),
        (status = 403, description = "Not the recipient", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["references"],
    operation_id = "answerReference"
)]
#[put("/users/{user_id}/references/{id}")]
pub async fn answer_reference(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(Uuid, Uuid)>,
    payload: web::Json<ReferenceRequest>,
) -> ApiResult<web::Json<ReferenceResponse>> {
    let (path_user, id) = path.into_inner();
    let user_id = require_owner(&session, path_user)?;
    let entry = payload.into_inner().into_entry()?;
    let reference = state
        .references
        .answer(&user_id, ReferenceId::from_uuid(id), entry)
        .await?;
    Ok(web::Json(render_one(&state, reference).await?))
}
