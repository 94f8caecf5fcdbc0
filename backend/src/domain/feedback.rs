//! Feedback aggregate: bug reports and ideas submitted by users.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{User, UserId};

/// Validation errors for feedback input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackValidationError {
    EmptyMessage,
    UnknownType(String),
    UnknownStatus(String),
}

impl FeedbackValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "message",
            Self::UnknownType(_) => "type",
            Self::UnknownStatus(_) => "status",
        }
    }
}

impl fmt::Display for FeedbackValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "message must not be empty"),
            Self::UnknownType(value) => {
                write!(f, "type must be one of bug, idea (got {value:?})")
            }
            Self::UnknownStatus(value) => write!(
                f,
                "status must be one of open, fixed, in progress, not applicable (got {value:?})"
            ),
        }
    }
}

impl std::error::Error for FeedbackValidationError {}

/// Kind of feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    #[default]
    Bug,
    Idea,
}

impl FeedbackType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Idea => "idea",
        }
    }
}

impl FromStr for FeedbackType {
    type Err = FeedbackValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bug" => Ok(Self::Bug),
            "idea" => Ok(Self::Idea),
            other => Err(FeedbackValidationError::UnknownType(other.to_owned())),
        }
    }
}

/// Triage status of a feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FeedbackStatus {
    #[default]
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "fixed")]
    Fixed,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "not applicable")]
    NotApplicable,
}

impl FeedbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fixed => "fixed",
            Self::InProgress => "in progress",
            Self::NotApplicable => "not applicable",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = FeedbackValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "fixed" => Ok(Self::Fixed),
            "in progress" => Ok(Self::InProgress),
            "not applicable" => Ok(Self::NotApplicable),
            other => Err(FeedbackValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Non-empty feedback text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage(String);

impl FeedbackMessage {
    pub fn new(message: impl Into<String>) -> Result<Self, FeedbackValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(FeedbackValidationError::EmptyMessage);
        }
        Ok(Self(message))
    }
}

impl AsRef<str> for FeedbackMessage {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Stable feedback identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(Uuid);

impl FeedbackId {
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

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editable feedback fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackContent {
    pub kind: FeedbackType,
    pub message: FeedbackMessage,
    pub url: Option<String>,
}

/// Flat representation used to rebuild a [`Feedback`] from storage.
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub user_id: Option<UserId>,
    pub content: FeedbackContent,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bug report or idea.
///
/// The author is optional: feedback survives the deletion of its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    id: FeedbackId,
    user_id: Option<UserId>,
    content: FeedbackContent,
    status: FeedbackStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Feedback {
    /// Submit new feedback; status starts `open`.
    pub fn submit(user_id: UserId, content: FeedbackContent, now: DateTime<Utc>) -> Self {
        Self {
            id: FeedbackId::random(),
            user_id: Some(user_id),
            content,
            status: FeedbackStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_record(record: FeedbackRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            content: record.content,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Owners and administrators may edit feedback.
    pub fn is_editable_by(&self, user: &User) -> bool {
        user.is_admin() || self.user_id.as_ref() == Some(user.id())
    }

    pub fn edit(&mut self, content: FeedbackContent, now: DateTime<Utc>) {
        self.content = content;
        self.updated_at = now;
    }

    pub fn change_status(&mut self, status: FeedbackStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_fixed(&self) -> bool {
        self.status == FeedbackStatus::Fixed
    }

    pub fn id(&self) -> FeedbackId {
        self.id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn content(&self) -> &FeedbackContent {
        &self.content
    }

    pub fn status(&self) -> FeedbackStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn content(message: &str) -> FeedbackContent {
        FeedbackContent {
            kind: FeedbackType::default(),
            message: FeedbackMessage::new(message).expect("message"),
            url: None,
        }
    }

    #[rstest]
    #[case("open", FeedbackStatus::Open)]
    #[case("fixed", FeedbackStatus::Fixed)]
    #[case("in progress", FeedbackStatus::InProgress)]
    #[case("not applicable", FeedbackStatus::NotApplicable)]
    fn statuses_use_their_display_names(#[case] raw: &str, #[case] status: FeedbackStatus) {
        assert_eq!(raw.parse::<FeedbackStatus>(), Ok(status));
        assert_eq!(status.as_str(), raw);
        assert_eq!(
            serde_json::to_value(status).expect("serialise"),
            serde_json::json!(raw)
        );
    }

    #[rstest]
    fn unknown_values_are_rejected() {
        assert_eq!(
            "feature".parse::<FeedbackType>(),
            Err(FeedbackValidationError::UnknownType("feature".to_owned()))
        );
        assert_eq!(
            "done".parse::<FeedbackStatus>().map_err(|err| err.field()),
            Err("status")
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_messages_are_rejected(#[case] raw: &str) {
        assert_eq!(
            FeedbackMessage::new(raw),
            Err(FeedbackValidationError::EmptyMessage)
        );
    }

    #[rstest]
    fn new_feedback_is_an_open_bug() {
        let feedback = Feedback::submit(UserId::random(), content("Map does not load"), Utc::now());
        assert_eq!(feedback.status(), FeedbackStatus::Open);
        assert_eq!(feedback.content().kind, FeedbackType::Bug);
        assert!(!feedback.is_fixed());
    }

    #[rstest]
    fn fixed_status_is_reported() {
        let mut feedback = Feedback::submit(UserId::random(), content("typo"), Utc::now());
        feedback.change_status(FeedbackStatus::Fixed, Utc::now());
        assert!(feedback.is_fixed());
    }
}
