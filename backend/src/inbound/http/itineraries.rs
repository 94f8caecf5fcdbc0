//! Itinerary HTTP handlers.
//!
//! ```text
//! POST /api/v1/itineraries            (form-encoded, multi-parameter dates)
//! GET /api/v1/itineraries?user_id=..
//! GET /api/v1/itineraries/search?start_lat=..&start_lng=..&end_lat=..&end_lng=..
//! GET /api/v1/itineraries/{id}
//! DELETE /api/v1/itineraries/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::NewItinerary;
use crate::domain::{Error, Itinerary, ItineraryId, ItinerarySearch, LatLng, Place, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::multiparam::{self, AssignedAttributes, Coerced, TargetKind};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{UserDirectory, UserSummary};
use crate::inbound::http::validation::{
    FieldName, geo_error, invalid_value_error, missing_field_error, parse_uuid,
};

/// Form accepted by `POST /api/v1/itineraries`.
///
/// Dates may be posted either as RFC 3339 strings or as multi-parameter
/// components (`leave_date(1i)` .. `leave_date(5i)`). Locations are
/// `"lat, lng"` strings. Flags accept `1`, `true`, `on` and `yes`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ItineraryForm {
    pub title: String,
    pub description: String,
    pub start_address: String,
    #[schema(example = "40.7369, 13.9488")]
    pub start_location: String,
    pub end_address: String,
    pub end_location: String,
    #[schema(format = "date-time")]
    pub leave_date: String,
    pub round_trip: Option<bool>,
    #[schema(format = "date-time")]
    pub return_date: Option<String>,
    pub daily: Option<bool>,
    pub num_people: u8,
    pub fuel_cost: Option<u32>,
    pub tolls: Option<u32>,
    pub smoking_allowed: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub pink: Option<bool>,
}

/// Address and coordinates of an itinerary end point.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceResponse {
    pub address: String,
    pub location: LatLng,
}

impl From<&Place> for PlaceResponse {
    fn from(place: &Place) -> Self {
        Self {
            address: place.address.clone(),
            location: place.location,
        }
    }
}

/// Itinerary as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub driver: UserSummary,
    pub title: String,
    pub description: String,
    pub start: PlaceResponse,
    pub end: PlaceResponse,
    pub leave_date: DateTime<Utc>,
    pub round_trip: bool,
    pub return_date: Option<DateTime<Utc>>,
    pub daily: bool,
    pub num_people: u8,
    pub fuel_cost: u32,
    pub tolls: u32,
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub pink: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItineraryResponse {
    pub(crate) fn new(itinerary: &Itinerary, users: &UserDirectory) -> Self {
        Self {
            id: itinerary.id().to_string(),
            driver: users.summary(itinerary.driver_id()),
            title: itinerary.title().to_owned(),
            description: itinerary.description().to_owned(),
            start: itinerary.start().into(),
            end: itinerary.end().into(),
            leave_date: itinerary.leave_date(),
            round_trip: itinerary.round_trip(),
            return_date: itinerary.return_date(),
            daily: itinerary.daily(),
            num_people: itinerary.num_people(),
            fuel_cost: itinerary.fuel_cost(),
            tolls: itinerary.tolls(),
            smoking_allowed: itinerary.smoking_allowed(),
            pets_allowed: itinerary.pets_allowed(),
            pink: itinerary.pink(),
            created_at: itinerary.created_at(),
            updated_at: itinerary.updated_at(),
        }
    }
}

/// Short itinerary reference embedded in conversations and references.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItinerarySummary {
    #[schema(format = "uuid")]
    pub id: String,
    pub title: String,
    pub leave_date: DateTime<Utc>,
}

impl From<&Itinerary> for ItinerarySummary {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            id: itinerary.id().to_string(),
            title: itinerary.title().to_owned(),
            leave_date: itinerary.leave_date(),
        }
    }
}

async fn render(state: &HttpState, itineraries: &[Itinerary]) -> ApiResult<Vec<ItineraryResponse>> {
    let users = UserDirectory::resolve(state, itineraries.iter().map(Itinerary::driver_id)).await?;
    Ok(itineraries
        .iter()
        .map(|itinerary| ItineraryResponse::new(itinerary, &users))
        .collect())
}

fn target_kind(attribute: &str) -> TargetKind {
    match attribute {
        "leave_date" | "return_date" => TargetKind::DateTime,
        _ => TargetKind::Raw,
    }
}

const TRUTHY: [&str; 4] = ["1", "true", "on", "yes"];
const FALSY: [&str; 5] = ["0", "false", "off", "no", ""];

fn text(attrs: &AssignedAttributes, field: &'static str) -> ApiResult<String> {
    attrs
        .plain(field)
        .map(str::to_owned)
        .ok_or_else(|| missing_field_error(FieldName::new(field)))
}

fn flag(attrs: &AssignedAttributes, field: &'static str) -> ApiResult<bool> {
    match attrs.plain(field).map(str::to_ascii_lowercase) {
        None => Ok(false),
        Some(value) if TRUTHY.contains(&value.as_str()) => Ok(true),
        Some(value) if FALSY.contains(&value.as_str()) => Ok(false),
        Some(value) => Err(invalid_value_error(
            FieldName::new(field),
            &value,
            "a boolean",
        )),
    }
}

fn number<T: std::str::FromStr>(
    attrs: &AssignedAttributes,
    field: &'static str,
    default: Option<T>,
) -> ApiResult<T> {
    match attrs.plain(field).map(str::trim) {
        None | Some("") => default.ok_or_else(|| missing_field_error(FieldName::new(field))),
        Some(value) => value.parse().map_err(|_| {
            invalid_value_error(FieldName::new(field), value, "a non-negative integer")
        }),
    }
}

fn location(attrs: &AssignedAttributes, field: &'static str) -> ApiResult<LatLng> {
    text(attrs, field)?
        .parse()
        .map_err(|err| geo_error(FieldName::new(field), err))
}

/// Blank components yield `None`; any kind other than a timestamp means the
/// field was registered with the wrong [`TargetKind`].
fn coerced_date_time(
    coerced: Option<&Coerced>,
    field: &'static str,
) -> ApiResult<Option<DateTime<Utc>>> {
    match coerced {
        None => Ok(None),
        Some(Coerced::DateTime(value)) => Ok(Some(*value)),
        Some(other) => Err(Error::internal(format!(
            "{field} coerced to {other:?} instead of a timestamp"
        ))),
    }
}

fn date_time(attrs: &AssignedAttributes, field: &'static str) -> ApiResult<Option<DateTime<Utc>>> {
    if attrs.has_components(field) {
        return coerced_date_time(attrs.coerced(field), field);
    }
    match attrs.plain(field).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| invalid_value_error(FieldName::new(field), value, "an RFC 3339 timestamp")),
    }
}

/// Turn posted form pairs into a [`NewItinerary`].
pub(crate) fn parse_itinerary_form(pairs: Vec<(String, String)>) -> ApiResult<NewItinerary> {
    let attrs = multiparam::assign(pairs, target_kind)?;
    let leave_date = date_time(&attrs, "leave_date")?
        .ok_or_else(|| missing_field_error(FieldName::new("leave_date")))?;
    Ok(NewItinerary {
        title: text(&attrs, "title")?,
        description: text(&attrs, "description")?,
        start: Place {
            address: text(&attrs, "start_address")?,
            location: location(&attrs, "start_location")?,
        },
        end: Place {
            address: text(&attrs, "end_address")?,
            location: location(&attrs, "end_location")?,
        },
        leave_date,
        round_trip: flag(&attrs, "round_trip")?,
        return_date: date_time(&attrs, "return_date")?,
        daily: flag(&attrs, "daily")?,
        num_people: number(&attrs, "num_people", None)?,
        fuel_cost: number(&attrs, "fuel_cost", Some(0))?,
        tolls: number(&attrs, "tolls", Some(0))?,
        smoking_allowed: flag(&attrs, "smoking_allowed")?,
        pets_allowed: flag(&attrs, "pets_allowed")?,
        pink: flag(&attrs, "pink")?,
    })
}

/// Offer a ride.
#[utoipa::path(
    post,
    path = "/api/v1/itineraries",
    request_body(content = ItineraryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Itinerary created", body = ItineraryResponse),
        (status = 400, description = "Invalid itinerary", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "createItinerary"
)]
#[post("/itineraries")]
pub async fn create_itinerary(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<Vec<(String, String)>>,
) -> ApiResult<HttpResponse> {
    let driver_id = session.require_user_id()?;
    let new_itinerary = parse_itinerary_form(form.into_inner())?;
    let itinerary = state.itineraries.publish(&driver_id, new_itinerary).await?;
    let users = UserDirectory::resolve(&state, [itinerary.driver_id()]).await?;
    Ok(HttpResponse::Created().json(ItineraryResponse::new(&itinerary, &users)))
}

/// Query for `GET /api/v1/itineraries`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DriverItinerariesParams {
    /// Driver whose itineraries are listed.
    pub user_id: Option<String>,
}

/// Itineraries offered by one driver.
#[utoipa::path(
    get,
    path = "/api/v1/itineraries",
    params(DriverItinerariesParams),
    responses(
        (status = 200, description = "Itineraries, newest first", body = [ItineraryResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "listItineraries"
)]
#[get("/itineraries")]
pub async fn list_itineraries(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<DriverItinerariesParams>,
) -> ApiResult<web::Json<Vec<ItineraryResponse>>> {
    session.require_user_id()?;
    let field = FieldName::new("user_id");
    let raw = params
        .into_inner()
        .user_id
        .ok_or_else(|| missing_field_error(field))?;
    let driver_id = UserId::from_uuid(parse_uuid(&raw, field)?);
    let itineraries = state.itineraries_query.list_for_driver(&driver_id).await?;
    Ok(web::Json(render(&state, &itineraries).await?))
}

/// Query for `GET /api/v1/itineraries/search`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    /// Defaults to 5 km, capped at 100 km.
    pub radius_km: Option<f64>,
    pub pink: Option<bool>,
    pub smoking_allowed: Option<bool>,
    pub pets_allowed: Option<bool>,
}

impl TryFrom<SearchParams> for ItinerarySearch {
    type Error = Error;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let start = LatLng::new(params.start_lat, params.start_lng)
            .map_err(|err| geo_error(FieldName::new("start"), err))?;
        let end = LatLng::new(params.end_lat, params.end_lng)
            .map_err(|err| geo_error(FieldName::new("end"), err))?;
        Ok(Self {
            start,
            end,
            radius_km: Self::radius_or_default(params.radius_km),
            pink: params.pink,
            smoking_allowed: params.smoking_allowed,
            pets_allowed: params.pets_allowed,
        })
    }
}

/// Upcoming itineraries near a start and an end point.
#[utoipa::path(
    get,
    path = "/api/v1/itineraries/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching itineraries", body = [ItineraryResponse]),
        (status = 400, description = "Invalid coordinates", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "searchItineraries"
)]
#[get("/itineraries/search")]
pub async fn search_itineraries(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Vec<ItineraryResponse>>> {
    session.require_user_id()?;
    let search = ItinerarySearch::try_from(params.into_inner())?;
    let itineraries = state.itineraries_query.search(search).await?;
    Ok(web::Json(render(&state, &itineraries).await?))
}

/// One itinerary with its driver.
#[utoipa::path(
    get,
    path = "/api/v1/itineraries/{id}",
    params(("id" = Uuid, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Itinerary", body = ItineraryResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "getItinerary"
)]
#[get("/itineraries/{id}")]
pub async fn get_itinerary(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ItineraryResponse>> {
    session.require_user_id()?;
    let itinerary = state
        .itineraries_query
        .get(ItineraryId::from_uuid(path.into_inner()))
        .await?;
    let users = UserDirectory::resolve(&state, [itinerary.driver_id()]).await?;
    Ok(web::Json(ItineraryResponse::new(&itinerary, &users)))
}

/// Withdraw an itinerary; drivers only.
#[utoipa::path(
    delete,
    path = "/api/v1/itineraries/{id}",
    params(("id" = Uuid, Path, description = "Itinerary id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the driver", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "deleteItinerary"
)]
#[delete("/itineraries/{id}")]
pub async fn delete_itinerary(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state
        .itineraries
        .remove(&user_id, ItineraryId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "itineraries_tests.rs"]
mod tests;
