//! Conversation aggregate: a message thread between a passenger and a driver.
//!
//! Read state is tracked per participant with a `read_at` timestamp; a thread
//! is unread for a user when someone else wrote to it after that instant.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::itinerary::ItineraryId;
use super::user::UserId;

/// Maximum number of characters in a message or reference body.
pub const BODY_MAX: usize = 1_000;

/// Validation errors for free-text bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyValidationError {
    Empty,
    TooLong { max: usize },
}

impl fmt::Display for BodyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "body must not be empty"),
            Self::TooLong { max } => write!(f, "body must be at most {max} characters"),
        }
    }
}

impl std::error::Error for BodyValidationError {}

pub(crate) fn validate_body(body: &str) -> Result<(), BodyValidationError> {
    if body.trim().is_empty() {
        return Err(BodyValidationError::Empty);
    }
    if body.chars().count() > BODY_MAX {
        return Err(BodyValidationError::TooLong { max: BODY_MAX });
    }
    Ok(())
}

/// Message text; kept verbatim, line breaks included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(body: impl Into<String>) -> Result<Self, BodyValidationError> {
        let body = body.into();
        validate_body(&body)?;
        Ok(Self(body))
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = BodyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors raised by conversation mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// Sender and recipient are the same user.
    SelfConversation,
    /// The user does not take part in the conversation.
    NotParticipant,
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfConversation => write!(f, "users cannot start a conversation with themselves"),
            Self::NotParticipant => write!(f, "user is not a participant of this conversation"),
        }
    }
}

impl std::error::Error for ConversationError {}

/// Stable conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
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

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity a conversation is attached to, stored as a type tag plus an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversable {
    Itinerary(ItineraryId),
}

impl Conversable {
    pub const ITINERARY: &'static str = "Itinerary";

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Itinerary(_) => Self::ITINERARY,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Itinerary(id) => *id.as_uuid(),
        }
    }

    /// Rebuild from the stored type tag and id.
    pub fn from_parts(type_name: &str, id: Uuid) -> Option<Self> {
        match type_name {
            Self::ITINERARY => Some(Self::Itinerary(ItineraryId::from_uuid(id))),
            _ => None,
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: UserId,
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
}

/// A user taking part in a conversation with their read marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: UserId,
    pub read_at: Option<DateTime<Utc>>,
}

/// Flat representation used to rebuild a [`Conversation`] from storage.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub conversable: Conversable,
    pub passenger_id: UserId,
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message thread attached to a conversable.
///
/// ## Invariants
/// - Participants are distinct.
/// - Messages are ordered by `created_at` and only sent by participants.
/// - A passenger opens at most one conversation per conversable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: ConversationId,
    conversable: Conversable,
    passenger_id: UserId,
    participants: Vec<Participant>,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Open a conversation with its first message.
    pub fn start(
        conversable: Conversable,
        sender_id: UserId,
        recipient_id: UserId,
        body: MessageBody,
        now: DateTime<Utc>,
    ) -> Result<Self, ConversationError> {
        if sender_id == recipient_id {
            return Err(ConversationError::SelfConversation);
        }
        let first = Message {
            id: Uuid::new_v4(),
            sender_id: sender_id.clone(),
            body,
            created_at: now,
        };
        Ok(Self {
            id: ConversationId::random(),
            conversable,
            passenger_id: sender_id.clone(),
            participants: vec![
                Participant {
                    user_id: sender_id,
                    read_at: Some(now),
                },
                Participant {
                    user_id: recipient_id,
                    read_at: None,
                },
            ],
            messages: vec![first],
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_record(record: ConversationRecord) -> Self {
        let mut messages = record.messages;
        messages.sort_by_key(|message| message.created_at);
        Self {
            id: record.id,
            conversable: record.conversable,
            passenger_id: record.passenger_id,
            participants: record.participants,
            messages,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Append a message and mark the thread read for its sender.
    pub fn reply(
        &mut self,
        sender_id: &UserId,
        body: MessageBody,
        now: DateTime<Utc>,
    ) -> Result<(), ConversationError> {
        if !self.is_participant(sender_id) {
            return Err(ConversationError::NotParticipant);
        }
        self.messages.push(Message {
            id: Uuid::new_v4(),
            sender_id: sender_id.clone(),
            body,
            created_at: now,
        });
        self.updated_at = now;
        self.mark_as_read(sender_id, now)
    }

    /// Record that `user_id` has seen every message up to `now`.
    pub fn mark_as_read(
        &mut self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ConversationError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|participant| &participant.user_id == user_id)
            .ok_or(ConversationError::NotParticipant)?;
        participant.read_at = Some(now);
        Ok(())
    }

    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.participant(user_id).is_some()
    }

    fn participant(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| &participant.user_id == user_id)
    }

    /// Whether someone else wrote after `user_id` last read the thread.
    pub fn is_unread_for(&self, user_id: &UserId) -> bool {
        let Some(participant) = self.participant(user_id) else {
            return false;
        };
        let latest_incoming = self
            .messages
            .iter()
            .rev()
            .find(|message| &message.sender_id != user_id);
        match (latest_incoming, participant.read_at) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(message), Some(read_at)) => message.created_at > read_at,
        }
    }

    /// Participants other than `user_id`.
    pub fn others<'a>(&'a self, user_id: &'a UserId) -> impl Iterator<Item = &'a UserId> + 'a {
        self.participants
            .iter()
            .map(|participant| &participant.user_id)
            .filter(move |id| *id != user_id)
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn conversable(&self) -> Conversable {
        self.conversable
    }

    /// User who opened the thread.
    pub fn passenger_id(&self) -> &UserId {
        &self.passenger_id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests;
