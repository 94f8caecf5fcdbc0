//! User aggregate and identity primitives.
//!
//! Users are never created through a sign-up form: they are derived from the
//! identity payload returned by the social-login provider and refreshed on
//! each sign-in.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::{AccessToken, AuthProvider, OAuthIdentity, ProviderData, ProviderLike, ProviderUid};

/// Validation errors returned by user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from a string.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable name shown to other users.
///
/// Provider names contain arbitrary scripts, so only emptiness and length are
/// checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is trimmed.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let display_name = display_name.into();
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Profile fields mirrored from the provider on every sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: DisplayName,
    pub email: Option<String>,
    pub image: Option<String>,
    pub gender: Option<String>,
    pub locale: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_link: Option<String>,
}

/// Provider data fetched out of band by the cache job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDataCache {
    pub friends_count: Option<u32>,
    pub likes: Vec<ProviderLike>,
    pub cached_at: Option<DateTime<Utc>>,
}

/// Flat representation used to rebuild a [`User`] from storage.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub provider: AuthProvider,
    pub uid: ProviderUid,
    pub profile: UserProfile,
    pub access_token: Option<AccessToken>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub admin: bool,
    pub banned: bool,
    pub provider_data: ProviderDataCache,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application user.
///
/// ## Invariants
/// - `(provider, uid)` identifies exactly one user.
/// - `display_name` is non-empty.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    provider: AuthProvider,
    uid: ProviderUid,
    profile: UserProfile,
    access_token: Option<AccessToken>,
    access_token_expires_at: Option<DateTime<Utc>>,
    admin: bool,
    banned: bool,
    provider_data: ProviderDataCache,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build a brand-new user from a provider identity.
    pub fn from_identity(identity: &OAuthIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::random(),
            provider: identity.provider,
            uid: identity.uid.clone(),
            profile: identity.profile(),
            access_token: Some(identity.credentials.token.clone()),
            access_token_expires_at: identity.credentials.expires_at,
            admin: false,
            banned: false,
            provider_data: ProviderDataCache::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from persisted state.
    pub fn from_record(record: UserRecord) -> Self {
        let UserRecord {
            id,
            provider,
            uid,
            profile,
            access_token,
            access_token_expires_at,
            admin,
            banned,
            provider_data,
            created_at,
            updated_at,
        } = record;
        Self {
            id,
            provider,
            uid,
            profile,
            access_token,
            access_token_expires_at,
            admin,
            banned,
            provider_data,
            created_at,
            updated_at,
        }
    }

    /// Refresh cached profile fields and credentials from a fresh identity.
    ///
    /// The provider and uid never change.
    pub fn update_info_from_identity(&mut self, identity: &OAuthIdentity, now: DateTime<Utc>) {
        self.profile = identity.profile();
        self.access_token = Some(identity.credentials.token.clone());
        self.access_token_expires_at = identity.credentials.expires_at;
        self.updated_at = now;
    }

    /// Store provider data fetched by the background job.
    pub fn cache_provider_data(&mut self, data: ProviderData, now: DateTime<Utc>) {
        self.provider_data = ProviderDataCache {
            friends_count: Some(data.friends_count),
            likes: data.likes,
            cached_at: Some(now),
        };
        self.updated_at = now;
    }

    /// Grant administrator rights.
    pub fn promote_to_admin(&mut self, now: DateTime<Utc>) {
        self.admin = true;
        self.updated_at = now;
    }

    /// Block or unblock future sign-ins.
    pub fn set_banned(&mut self, banned: bool, now: DateTime<Utc>) {
        self.banned = banned;
        self.updated_at = now;
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn provider(&self) -> AuthProvider {
        self.provider
    }

    pub fn uid(&self) -> &ProviderUid {
        &self.uid
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.profile.display_name
    }

    /// Access token usable while it has not expired.
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<&AccessToken> {
        match self.access_token_expires_at {
            Some(expires_at) if expires_at <= now => None,
            _ => self.access_token.as_ref(),
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_token_expires_at
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn is_banned(&self) -> bool {
        self.banned
    }

    pub fn provider_data(&self) -> &ProviderDataCache {
        &self.provider_data
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name().as_ref())
    }
}

#[cfg(test)]
mod tests;
