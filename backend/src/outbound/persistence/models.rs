//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Each row converts into the
//! domain's flat `*Record` type; stored values that no longer satisfy domain
//! validation surface as a `String` message which repositories map to a
//! query error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AccessToken, AuthProvider, Conversable, Conversation, ConversationId, ConversationRecord,
    DisplayName, Feedback, FeedbackContent, FeedbackId, FeedbackMessage, FeedbackRecord,
    FeedbackStatus, FeedbackType, Itinerary, ItineraryDraft, ItineraryId, LatLng, Message,
    MessageBody, Participant, Place, ProviderDataCache, ProviderLike, ProviderUid, Rating,
    Reference, ReferenceBody, ReferenceEntry, ReferenceId, ReferenceRecord, User, UserId,
    UserProfile, UserRecord,
};

use super::schema::{
    conversation_participants, conversations, feedbacks, itineraries, messages, user_references,
    users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Full user row, used for reads and upserts alike.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub provider: String,
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub gender: Option<String>,
    pub locale: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_link: Option<String>,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub admin: bool,
    pub banned: bool,
    pub friends_count: Option<i32>,
    pub likes: serde_json::Value,
    pub provider_data_cached_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn from_user(user: &User) -> Result<Self, String> {
        let profile = user.profile();
        let cache = user.provider_data();
        let friends_count = cache
            .friends_count
            .map(i32::try_from)
            .transpose()
            .map_err(|err| format!("friends count out of range: {err}"))?;
        let likes = serde_json::to_value(&cache.likes)
            .map_err(|err| format!("likes did not serialise: {err}"))?;
        Ok(Self {
            id: *user.id().as_uuid(),
            provider: user.provider().as_str().to_owned(),
            uid: user.uid().as_ref().to_owned(),
            display_name: profile.display_name.as_ref().to_owned(),
            email: profile.email.clone(),
            image: profile.image.clone(),
            gender: profile.gender.clone(),
            locale: profile.locale.clone(),
            birthday: profile.birthday,
            profile_link: profile.profile_link.clone(),
            access_token: user.access_token().map(|token| token.expose().to_owned()),
            access_token_expires_at: user.access_token_expires_at(),
            admin: user.is_admin(),
            banned: user.is_banned(),
            friends_count,
            likes,
            provider_data_cached_at: cache.cached_at,
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        })
    }

    pub(crate) fn into_user(self) -> Result<User, String> {
        let provider = self
            .provider
            .parse::<AuthProvider>()
            .map_err(|err| err.to_string())?;
        let uid = ProviderUid::new(self.uid).map_err(|err| err.to_string())?;
        let display_name = DisplayName::new(self.display_name).map_err(|err| err.to_string())?;
        let likes: Vec<ProviderLike> = serde_json::from_value(self.likes)
            .map_err(|err| format!("stored likes are malformed: {err}"))?;
        let friends_count = self
            .friends_count
            .map(u32::try_from)
            .transpose()
            .map_err(|err| format!("stored friends count is negative: {err}"))?;
        Ok(User::from_record(UserRecord {
            id: UserId::from_uuid(self.id),
            provider,
            uid,
            profile: UserProfile {
                display_name,
                email: self.email,
                image: self.image,
                gender: self.gender,
                locale: self.locale,
                birthday: self.birthday,
                profile_link: self.profile_link,
            },
            access_token: self.access_token.map(AccessToken::new),
            access_token_expires_at: self.access_token_expires_at,
            admin: self.admin,
            banned: self.banned,
            provider_data: ProviderDataCache {
                friends_count,
                likes,
                cached_at: self.provider_data_cached_at,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

// ---------------------------------------------------------------------------
// Itineraries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = itineraries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ItineraryRow {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_address: String,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_address: String,
    pub end_lat: f64,
    pub end_lng: f64,
    pub leave_date: DateTime<Utc>,
    pub round_trip: bool,
    pub return_date: Option<DateTime<Utc>>,
    pub daily: bool,
    pub num_people: i16,
    pub fuel_cost: i32,
    pub tolls: i32,
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub pink: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItineraryRow {
    pub(crate) fn from_itinerary(itinerary: &Itinerary) -> Result<Self, String> {
        let amount = |value: u32, field: &str| {
            i32::try_from(value).map_err(|_| format!("{field} exceeds the column range"))
        };
        Ok(Self {
            id: *itinerary.id().as_uuid(),
            driver_id: *itinerary.driver_id().as_uuid(),
            title: itinerary.title().to_owned(),
            description: itinerary.description().to_owned(),
            start_address: itinerary.start().address.clone(),
            start_lat: itinerary.start().location.lat(),
            start_lng: itinerary.start().location.lng(),
            end_address: itinerary.end().address.clone(),
            end_lat: itinerary.end().location.lat(),
            end_lng: itinerary.end().location.lng(),
            leave_date: itinerary.leave_date(),
            round_trip: itinerary.round_trip(),
            return_date: itinerary.return_date(),
            daily: itinerary.daily(),
            num_people: i16::from(itinerary.num_people()),
            fuel_cost: amount(itinerary.fuel_cost(), "fuel_cost")?,
            tolls: amount(itinerary.tolls(), "tolls")?,
            smoking_allowed: itinerary.smoking_allowed(),
            pets_allowed: itinerary.pets_allowed(),
            pink: itinerary.pink(),
            created_at: itinerary.created_at(),
            updated_at: itinerary.updated_at(),
        })
    }

    pub(crate) fn into_itinerary(self) -> Result<Itinerary, String> {
        let place = |address: String, lat: f64, lng: f64| {
            LatLng::new(lat, lng)
                .map(|location| Place { address, location })
                .map_err(|err| err.to_string())
        };
        let amount = |value: i32, field: &str| {
            u32::try_from(value).map_err(|_| format!("stored {field} is negative"))
        };
        let draft = ItineraryDraft {
            id: ItineraryId::from_uuid(self.id),
            driver_id: UserId::from_uuid(self.driver_id),
            title: self.title,
            description: self.description,
            start: place(self.start_address, self.start_lat, self.start_lng)?,
            end: place(self.end_address, self.end_lat, self.end_lng)?,
            leave_date: self.leave_date,
            round_trip: self.round_trip,
            return_date: self.return_date,
            daily: self.daily,
            num_people: u8::try_from(self.num_people)
                .map_err(|_| "stored num_people is out of range".to_owned())?,
            fuel_cost: amount(self.fuel_cost, "fuel_cost")?,
            tolls: amount(self.tolls, "tolls")?,
            smoking_allowed: self.smoking_allowed,
            pets_allowed: self.pets_allowed,
            pink: self.pink,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Itinerary::restore(draft).map_err(|err| err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConversationRow {
    pub id: Uuid,
    pub conversable_type: String,
    pub conversable_id: Uuid,
    pub passenger_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = conversation_participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ParticipantRow {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Rows making up one conversation aggregate.
pub(crate) struct ConversationRows {
    pub conversation: ConversationRow,
    pub participants: Vec<ParticipantRow>,
    pub messages: Vec<MessageRow>,
}

impl ConversationRows {
    pub(crate) fn from_conversation(conversation: &Conversation) -> Self {
        let id = *conversation.id().as_uuid();
        let conversable = conversation.conversable();
        Self {
            conversation: ConversationRow {
                id,
                conversable_type: conversable.type_name().to_owned(),
                conversable_id: conversable.id(),
                passenger_id: *conversation.passenger_id().as_uuid(),
                created_at: conversation.created_at(),
                updated_at: conversation.updated_at(),
            },
            participants: conversation
                .participants()
                .iter()
                .map(|participant| ParticipantRow {
                    conversation_id: id,
                    user_id: *participant.user_id.as_uuid(),
                    read_at: participant.read_at,
                })
                .collect(),
            messages: conversation
                .messages()
                .iter()
                .map(|message| MessageRow {
                    id: message.id,
                    conversation_id: id,
                    sender_id: *message.sender_id.as_uuid(),
                    body: message.body.as_ref().to_owned(),
                    created_at: message.created_at,
                })
                .collect(),
        }
    }

    pub(crate) fn into_record(self) -> Result<ConversationRecord, String> {
        let row = self.conversation;
        let conversable = Conversable::from_parts(&row.conversable_type, row.conversable_id)
            .ok_or_else(|| format!("unknown conversable type {}", row.conversable_type))?;
        let messages = self
            .messages
            .into_iter()
            .map(|message| {
                MessageBody::new(message.body)
                    .map(|body| Message {
                        id: message.id,
                        sender_id: UserId::from_uuid(message.sender_id),
                        body,
                        created_at: message.created_at,
                    })
                    .map_err(|err| err.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConversationRecord {
            id: ConversationId::from_uuid(row.id),
            conversable,
            passenger_id: UserId::from_uuid(row.passenger_id),
            participants: self
                .participants
                .into_iter()
                .map(|participant| Participant {
                    user_id: UserId::from_uuid(participant.user_id),
                    read_at: participant.read_at,
                })
                .collect(),
            messages,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_references)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ReferenceRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub recipient_id: Uuid,
    pub itinerary_id: Uuid,
    pub outgoing_rating: i16,
    pub outgoing_body: String,
    pub incoming_rating: Option<i16>,
    pub incoming_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn entry_from_columns(rating: i16, body: String) -> Result<ReferenceEntry, String> {
    Ok(ReferenceEntry {
        rating: Rating::try_from(rating).map_err(|err| err.to_string())?,
        body: ReferenceBody::new(body).map_err(|err| err.to_string())?,
    })
}

impl ReferenceRow {
    pub(crate) fn from_reference(reference: &Reference) -> Self {
        let incoming = reference.incoming();
        Self {
            id: *reference.id().as_uuid(),
            author_id: *reference.author_id().as_uuid(),
            recipient_id: *reference.recipient_id().as_uuid(),
            itinerary_id: *reference.itinerary_id().as_uuid(),
            outgoing_rating: reference.outgoing().rating.value(),
            outgoing_body: reference.outgoing().body.as_ref().to_owned(),
            incoming_rating: incoming.map(|entry| entry.rating.value()),
            incoming_body: incoming.map(|entry| entry.body.as_ref().to_owned()),
            created_at: reference.created_at(),
            updated_at: reference.updated_at(),
        }
    }

    pub(crate) fn into_reference(self) -> Result<Reference, String> {
        let incoming = match (self.incoming_rating, self.incoming_body) {
            (Some(rating), Some(body)) => Some(entry_from_columns(rating, body)?),
            (None, None) => None,
            _ => return Err("incoming rating and body must be stored together".to_owned()),
        };
        Ok(Reference::from_record(ReferenceRecord {
            id: ReferenceId::from_uuid(self.id),
            author_id: UserId::from_uuid(self.author_id),
            recipient_id: UserId::from_uuid(self.recipient_id),
            itinerary_id: ItineraryId::from_uuid(self.itinerary_id),
            outgoing: entry_from_columns(self.outgoing_rating, self.outgoing_body)?,
            incoming,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

// ---------------------------------------------------------------------------
// Feedbacks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = feedbacks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct FeedbackRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackRow {
    pub(crate) fn from_feedback(feedback: &Feedback) -> Self {
        let content = feedback.content();
        Self {
            id: *feedback.id().as_uuid(),
            user_id: feedback.user_id().map(|id| *id.as_uuid()),
            kind: content.kind.as_str().to_owned(),
            message: content.message.as_ref().to_owned(),
            url: content.url.clone(),
            status: feedback.status().as_str().to_owned(),
            created_at: feedback.created_at(),
            updated_at: feedback.updated_at(),
        }
    }

    pub(crate) fn into_feedback(self) -> Result<Feedback, String> {
        Ok(Feedback::from_record(FeedbackRecord {
            id: FeedbackId::from_uuid(self.id),
            user_id: self.user_id.map(UserId::from_uuid),
            content: FeedbackContent {
                kind: self
                    .kind
                    .parse::<FeedbackType>()
                    .map_err(|err| err.to_string())?,
                message: FeedbackMessage::new(self.message).map_err(|err| err.to_string())?,
                url: self.url,
            },
            status: self
                .status
                .parse::<FeedbackStatus>()
                .map_err(|err| err.to_string())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{facebook_identity, fixture_timestamp};
    use rstest::rstest;

    fn user_row() -> UserRow {
        let user = User::from_identity(&facebook_identity("77", "Rosa"), fixture_timestamp());
        UserRow::from_user(&user).expect("fresh user maps to a row")
    }

    fn reference_row() -> ReferenceRow {
        ReferenceRow {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            itinerary_id: Uuid::new_v4(),
            outgoing_rating: 1,
            outgoing_body: "Smooth ride".to_owned(),
            incoming_rating: None,
            incoming_body: None,
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        }
    }

    #[rstest]
    fn user_rows_keep_flags_and_empty_likes() {
        let row = user_row();
        assert_eq!(row.provider, "facebook");
        assert_eq!(row.likes, serde_json::json!([]));

        let user = row.into_user().expect("row decodes");
        assert!(!user.is_admin());
        assert!(!user.is_banned());
    }

    #[rstest]
    fn negative_friend_counts_are_rejected() {
        let mut row = user_row();
        row.friends_count = Some(-3);

        let err = row.into_user().expect_err("negative count");
        assert!(err.contains("negative"));
    }

    #[rstest]
    fn half_stored_answers_are_rejected() {
        let mut row = reference_row();
        row.incoming_rating = Some(0);

        assert!(row.into_reference().is_err());
    }

    #[rstest]
    #[case(2)]
    #[case(-2)]
    fn ratings_outside_the_scale_are_rejected(#[case] rating: i16) {
        let mut row = reference_row();
        row.outgoing_rating = rating;

        assert!(row.into_reference().is_err());
    }

    #[rstest]
    fn unknown_feedback_status_is_rejected() {
        let row = FeedbackRow {
            id: Uuid::new_v4(),
            user_id: None,
            kind: "bug".to_owned(),
            message: "Map does not load".to_owned(),
            url: None,
            status: "wontfix".to_owned(),
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        };

        assert!(row.into_feedback().is_err());
    }
}
