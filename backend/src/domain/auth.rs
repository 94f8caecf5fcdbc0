//! Social-login primitives.
//!
//! The OAuth handshake itself belongs to the provider adapter; the domain only
//! sees the resulting identity payload, the anti-forgery state and the
//! authorization code.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::user::{DisplayName, UserProfile};

/// Domain error returned when authentication inputs are malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Provider uid was blank.
    EmptyUid,
    /// Authorization code was blank.
    EmptyCode,
    /// Provider name is not supported.
    UnknownProvider(String),
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUid => write!(f, "provider uid must not be empty"),
            Self::EmptyCode => write!(f, "authorization code must not be empty"),
            Self::UnknownProvider(name) => write!(f, "unsupported auth provider: {name}"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

/// Supported social-login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Facebook,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = AuthValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "facebook" => Ok(Self::Facebook),
            other => Err(AuthValidationError::UnknownProvider(other.to_owned())),
        }
    }
}

/// Identifier of the user at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderUid(String);

impl ProviderUid {
    pub fn new(uid: impl Into<String>) -> Result<Self, AuthValidationError> {
        let uid = uid.into();
        let trimmed = uid.trim();
        if trimmed.is_empty() {
            return Err(AuthValidationError::EmptyUid);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ProviderUid {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProviderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Provider access token; wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Credentials granted by the provider at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub token: AccessToken,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Identity payload returned by the provider after a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub provider: AuthProvider,
    pub uid: ProviderUid,
    pub name: DisplayName,
    pub email: Option<String>,
    pub image: Option<String>,
    pub gender: Option<String>,
    pub locale: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub link: Option<String>,
    pub credentials: ProviderCredentials,
}

impl OAuthIdentity {
    /// Profile fields cached on the user record.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            display_name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            gender: self.gender.clone(),
            locale: self.locale.clone(),
            birthday: self.birthday,
            profile_link: self.link.clone(),
        }
    }
}

/// A page the user likes at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLike {
    pub id: String,
    pub name: String,
}

/// Additional provider data fetched after sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderData {
    pub friends_count: u32,
    pub likes: Vec<ProviderLike>,
}

/// Anti-forgery `state` parameter round-tripped through the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthState(String);

const OAUTH_STATE_BYTES: usize = 32;

impl OAuthState {
    /// Generate a fresh random state token.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; OAUTH_STATE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Restore a state previously stored in the session.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Whether the state echoed by the provider matches this one.
    pub fn matches(&self, echoed: &str) -> bool {
        let expected = self.0.as_bytes();
        let echoed = echoed.as_bytes();
        expected.len() == echoed.len()
            && expected
                .iter()
                .zip(echoed)
                .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl AsRef<str> for OAuthState {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Authorization code returned to the callback.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(Zeroizing<String>);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Result<Self, AuthValidationError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(AuthValidationError::EmptyCode);
        }
        Ok(Self(Zeroizing::new(code)))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_uid_is_rejected(#[case] raw: &str) {
        assert_eq!(ProviderUid::new(raw), Err(AuthValidationError::EmptyUid));
    }

    #[rstest]
    fn uid_is_trimmed() {
        let uid = ProviderUid::new(" 123456 ").expect("valid uid");
        assert_eq!(uid.as_ref(), "123456");
    }

    #[rstest]
    fn blank_code_is_rejected() {
        assert!(matches!(
            AuthorizationCode::new(" "),
            Err(AuthValidationError::EmptyCode)
        ));
    }

    #[rstest]
    fn provider_parses_known_names_only() {
        assert_eq!("facebook".parse::<AuthProvider>(), Ok(AuthProvider::Facebook));
        assert!("myspace".parse::<AuthProvider>().is_err());
    }

    #[rstest]
    fn generated_states_are_distinct_and_match_themselves() {
        let first = OAuthState::generate();
        let second = OAuthState::generate();
        assert_ne!(first, second);
        assert_eq!(first.as_ref().len(), OAUTH_STATE_BYTES * 2);
        assert!(first.matches(first.as_ref()));
        assert!(!first.matches(second.as_ref()));
        assert!(!first.matches(""));
    }

    #[rstest]
    fn secrets_are_redacted_in_debug_output() {
        let token = AccessToken::new("very-secret");
        let code = AuthorizationCode::new("also-secret").expect("code");
        assert!(!format!("{token:?}").contains("very-secret"));
        assert!(!format!("{code:?}").contains("also-secret"));
    }
}
