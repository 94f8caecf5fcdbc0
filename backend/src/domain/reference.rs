//! Reference aggregate: a passenger's review of a driver for an itinerary,
//! optionally answered by the driver.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::conversation::{BodyValidationError, validate_body};
use super::itinerary::{Itinerary, ItineraryId};
use super::user::UserId;

/// Rating attached to a reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Rating {
    Negative,
    Neutral,
    Positive,
}

/// Raised when a rating outside `{-1, 0, 1}` is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRating(pub i16);

impl fmt::Display for InvalidRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rating must be -1, 0 or 1 (got {})", self.0)
    }
}

impl std::error::Error for InvalidRating {}

impl Rating {
    pub fn value(self) -> i16 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }
}

impl TryFrom<i16> for Rating {
    type Error = InvalidRating;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Negative),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Positive),
            other => Err(InvalidRating(other)),
        }
    }
}

impl From<Rating> for i16 {
    fn from(value: Rating) -> Self {
        value.value()
    }
}

/// Review text; kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceBody(String);

impl ReferenceBody {
    pub fn new(body: impl Into<String>) -> Result<Self, BodyValidationError> {
        let body = body.into();
        validate_body(&body)?;
        Ok(Self(body))
    }
}

impl AsRef<str> for ReferenceBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// One side of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub rating: Rating,
    pub body: ReferenceBody,
}

/// Errors raised by reference mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Drivers cannot review their own itinerary.
    OwnItinerary,
    /// Only the reviewed driver may answer.
    NotRecipient,
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnItinerary => write!(f, "users cannot reference their own itinerary"),
            Self::NotRecipient => write!(f, "only the referenced user can answer"),
        }
    }
}

impl std::error::Error for ReferenceError {}

/// Stable reference identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(Uuid);

impl ReferenceId {
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

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flat representation used to rebuild a [`Reference`] from storage.
#[derive(Debug, Clone)]
pub struct ReferenceRecord {
    pub id: ReferenceId,
    pub author_id: UserId,
    pub recipient_id: UserId,
    pub itinerary_id: ItineraryId,
    pub outgoing: ReferenceEntry,
    pub incoming: Option<ReferenceEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review written by `author` about the driver (`recipient`) of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    id: ReferenceId,
    author_id: UserId,
    recipient_id: UserId,
    itinerary_id: ItineraryId,
    outgoing: ReferenceEntry,
    incoming: Option<ReferenceEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reference {
    /// Write a new reference about the driver of `itinerary`.
    pub fn write(
        author_id: UserId,
        itinerary: &Itinerary,
        outgoing: ReferenceEntry,
        now: DateTime<Utc>,
    ) -> Result<Self, ReferenceError> {
        if itinerary.is_driven_by(&author_id) {
            return Err(ReferenceError::OwnItinerary);
        }
        Ok(Self {
            id: ReferenceId::random(),
            author_id,
            recipient_id: itinerary.driver_id().clone(),
            itinerary_id: itinerary.id(),
            outgoing,
            incoming: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_record(record: ReferenceRecord) -> Self {
        Self {
            id: record.id,
            author_id: record.author_id,
            recipient_id: record.recipient_id,
            itinerary_id: record.itinerary_id,
            outgoing: record.outgoing,
            incoming: record.incoming,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Store the recipient's answer, replacing any previous one.
    pub fn answer(
        &mut self,
        responder_id: &UserId,
        entry: ReferenceEntry,
        now: DateTime<Utc>,
    ) -> Result<(), ReferenceError> {
        if responder_id != &self.recipient_id {
            return Err(ReferenceError::NotRecipient);
        }
        self.incoming = Some(entry);
        self.updated_at = now;
        Ok(())
    }

    /// Author and recipient may read the reference.
    pub fn is_visible_to(&self, user_id: &UserId) -> bool {
        user_id == &self.author_id || user_id == &self.recipient_id
    }

    pub fn id(&self) -> ReferenceId {
        self.id
    }

    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    pub fn itinerary_id(&self) -> ItineraryId {
        self.itinerary_id
    }

    pub fn outgoing(&self) -> &ReferenceEntry {
        &self.outgoing
    }

    pub fn incoming(&self) -> Option<&ReferenceEntry> {
        self.incoming.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Counts of received references by rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReferenceSummary {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl<'a> FromIterator<&'a Reference> for ReferenceSummary {
    fn from_iter<I: IntoIterator<Item = &'a Reference>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |mut summary, reference| {
                match reference.outgoing.rating {
                    Rating::Positive => summary.positive += 1,
                    Rating::Neutral => summary.neutral += 1,
                    Rating::Negative => summary.negative += 1,
                }
                summary
            })
    }
}
