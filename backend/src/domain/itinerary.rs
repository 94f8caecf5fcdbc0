//! Itinerary aggregate: a ride offered by a driver.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::{GeoBounds, LatLng};
use super::user::UserId;

/// Maximum number of characters in an itinerary title.
pub const TITLE_MAX: usize = 80;
/// Maximum number of characters in an itinerary description.
pub const DESCRIPTION_MAX: usize = 1_000;
/// Seats bounds, driver excluded.
pub const NUM_PEOPLE_MIN: u8 = 1;
pub const NUM_PEOPLE_MAX: u8 = 8;
/// Search radius used when the client does not send one.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 5.0;
/// Largest search radius accepted from clients.
pub const MAX_SEARCH_RADIUS_KM: f64 = 100.0;

/// Validation errors for itinerary drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    EmptyDescription,
    DescriptionTooLong { max: usize },
    EmptyAddress { field: &'static str },
    LeaveDateInPast,
    MissingReturnDate,
    ReturnBeforeLeave,
    NumPeopleOutOfRange { min: u8, max: u8 },
    OutsideBounds { field: &'static str },
}

impl ItineraryValidationError {
    /// Name of the offending form field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyDescription | Self::DescriptionTooLong { .. } => "description",
            Self::EmptyAddress { field } | Self::OutsideBounds { field } => field,
            Self::LeaveDateInPast => "leave_date",
            Self::MissingReturnDate | Self::ReturnBeforeLeave => "return_date",
            Self::NumPeopleOutOfRange { .. } => "num_people",
        }
    }
}

impl fmt::Display for ItineraryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
            Self::EmptyAddress { field } => write!(f, "{field} must not be empty"),
            Self::LeaveDateInPast => write!(f, "leave date must be in the future"),
            Self::MissingReturnDate => write!(f, "round trips need a return date"),
            Self::ReturnBeforeLeave => write!(f, "return date must be after the leave date"),
            Self::NumPeopleOutOfRange { min, max } => {
                write!(f, "number of people must be between {min} and {max}")
            }
            Self::OutsideBounds { field } => {
                write!(f, "{field} is outside the area served by this service")
            }
        }
    }
}

impl std::error::Error for ItineraryValidationError {}

/// Stable itinerary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryId(Uuid);

impl ItineraryId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItineraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address entered by the driver together with its geocoded position.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub address: String,
    pub location: LatLng,
}

/// Input payload for [`Itinerary::publish`] and [`Itinerary::restore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDraft {
    pub id: ItineraryId,
    pub driver_id: UserId,
    pub title: String,
    pub description: String,
    pub start: Place,
    pub end: Place,
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

/// A ride offered by a driver.
///
/// ## Invariants
/// - `title`, `description` and both addresses are non-empty.
/// - Round trips carry a `return_date` strictly after `leave_date`; one-way
///   trips carry none.
/// - `num_people` is within `NUM_PEOPLE_MIN..=NUM_PEOPLE_MAX`.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    id: ItineraryId,
    driver_id: UserId,
    title: String,
    description: String,
    start: Place,
    end: Place,
    leave_date: DateTime<Utc>,
    round_trip: bool,
    return_date: Option<DateTime<Utc>>,
    daily: bool,
    num_people: u8,
    fuel_cost: u32,
    tolls: u32,
    smoking_allowed: bool,
    pets_allowed: bool,
    pink: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Itinerary {
    /// Validate a new itinerary offered at `now`.
    ///
    /// When `restriction` is set both endpoints must fall inside it.
    pub fn publish(
        draft: ItineraryDraft,
        now: DateTime<Utc>,
        restriction: Option<&GeoBounds>,
    ) -> Result<Self, ItineraryValidationError> {
        if draft.leave_date <= now {
            return Err(ItineraryValidationError::LeaveDateInPast);
        }
        if let Some(bounds) = restriction {
            if !bounds.contains(&draft.start.location) {
                return Err(ItineraryValidationError::OutsideBounds {
                    field: "start_address",
                });
            }
            if !bounds.contains(&draft.end.location) {
                return Err(ItineraryValidationError::OutsideBounds {
                    field: "end_address",
                });
            }
        }
        Self::restore(draft)
    }

    /// Rebuild an itinerary from storage, checking structural invariants only.
    pub fn restore(draft: ItineraryDraft) -> Result<Self, ItineraryValidationError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(ItineraryValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX {
            return Err(ItineraryValidationError::TitleTooLong { max: TITLE_MAX });
        }
        if draft.description.trim().is_empty() {
            return Err(ItineraryValidationError::EmptyDescription);
        }
        if draft.description.chars().count() > DESCRIPTION_MAX {
            return Err(ItineraryValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        if draft.start.address.trim().is_empty() {
            return Err(ItineraryValidationError::EmptyAddress {
                field: "start_address",
            });
        }
        if draft.end.address.trim().is_empty() {
            return Err(ItineraryValidationError::EmptyAddress {
                field: "end_address",
            });
        }
        if !(NUM_PEOPLE_MIN..=NUM_PEOPLE_MAX).contains(&draft.num_people) {
            return Err(ItineraryValidationError::NumPeopleOutOfRange {
                min: NUM_PEOPLE_MIN,
                max: NUM_PEOPLE_MAX,
            });
        }
        let return_date = if draft.round_trip {
            let return_date = draft
                .return_date
                .ok_or(ItineraryValidationError::MissingReturnDate)?;
            if return_date <= draft.leave_date {
                return Err(ItineraryValidationError::ReturnBeforeLeave);
            }
            Some(return_date)
        } else {
            None
        };

        Ok(Self {
            id: draft.id,
            driver_id: draft.driver_id,
            title,
            description: draft.description,
            start: draft.start,
            end: draft.end,
            leave_date: draft.leave_date,
            round_trip: draft.round_trip,
            return_date,
            daily: draft.daily,
            num_people: draft.num_people,
            fuel_cost: draft.fuel_cost,
            tolls: draft.tolls,
            smoking_allowed: draft.smoking_allowed,
            pets_allowed: draft.pets_allowed,
            pink: draft.pink,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }

    pub fn id(&self) -> ItineraryId {
        self.id
    }

    pub fn driver_id(&self) -> &UserId {
        &self.driver_id
    }

    /// Whether `user_id` drives this itinerary.
    pub fn is_driven_by(&self, user_id: &UserId) -> bool {
        &self.driver_id == user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start(&self) -> &Place {
        &self.start
    }

    pub fn end(&self) -> &Place {
        &self.end
    }

    pub fn leave_date(&self) -> DateTime<Utc> {
        self.leave_date
    }

    pub fn round_trip(&self) -> bool {
        self.round_trip
    }

    pub fn return_date(&self) -> Option<DateTime<Utc>> {
        self.return_date
    }

    pub fn daily(&self) -> bool {
        self.daily
    }

    pub fn num_people(&self) -> u8 {
        self.num_people
    }

    pub fn fuel_cost(&self) -> u32 {
        self.fuel_cost
    }

    pub fn tolls(&self) -> u32 {
        self.tolls
    }

    pub fn smoking_allowed(&self) -> bool {
        self.smoking_allowed
    }

    pub fn pets_allowed(&self) -> bool {
        self.pets_allowed
    }

    pub fn pink(&self) -> bool {
        self.pink
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Geographic search over upcoming itineraries.
#[derive(Debug, Clone, PartialEq)]
pub struct ItinerarySearch {
    pub start: LatLng,
    pub end: LatLng,
    pub radius_km: f64,
    pub pink: Option<bool>,
    pub smoking_allowed: Option<bool>,
    pub pets_allowed: Option<bool>,
}

impl ItinerarySearch {
    /// Clamp a client supplied radius into the accepted range.
    pub fn radius_or_default(radius_km: Option<f64>) -> f64 {
        match radius_km {
            Some(radius) if radius.is_finite() && radius > 0.0 => radius.min(MAX_SEARCH_RADIUS_KM),
            _ => DEFAULT_SEARCH_RADIUS_KM,
        }
    }

    /// Whether `itinerary` starts and ends within the radius and honours the
    /// requested flags.
    pub fn matches(&self, itinerary: &Itinerary) -> bool {
        let flag_matches =
            |wanted: Option<bool>, actual: bool| wanted.is_none_or(|wanted| wanted == actual);
        itinerary.start.location.distance_km(&self.start) <= self.radius_km
            && itinerary.end.location.distance_km(&self.end) <= self.radius_km
            && flag_matches(self.pink, itinerary.pink)
            && flag_matches(self.smoking_allowed, itinerary.smoking_allowed)
            && flag_matches(self.pets_allowed, itinerary.pets_allowed)
    }
}
