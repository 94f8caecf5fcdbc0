//! Port for the social-login provider.
//!
//! Adapters own the OAuth handshake details: building the authorization URL,
//! exchanging the callback code for a token and reading the user's profile.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use url::Url;

use crate::domain::{
    AccessToken, AuthProvider, AuthorizationCode, DisplayName, OAuthIdentity, OAuthState,
    ProviderCredentials, ProviderData, ProviderLike, ProviderUid,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by OAuth provider adapters.
    pub enum OAuthProviderError {
        /// The provider could not be reached.
        Transport { message: String } => "oauth provider unreachable: {message}",
        /// The provider refused the request (bad code, expired token).
        Rejected { message: String } => "oauth provider rejected the request: {message}",
        /// The provider answered with a payload we cannot use.
        InvalidPayload { message: String } => "oauth provider payload invalid: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Provider handled by this adapter.
    fn provider(&self) -> AuthProvider;

    /// URL the browser is redirected to in order to grant access.
    fn authorize_url(&self, state: &OAuthState) -> Result<Url, OAuthProviderError>;

    /// Exchange the callback code for the user's identity.
    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<OAuthIdentity, OAuthProviderError>;

    /// Fetch friends count and likes with a stored access token.
    async fn fetch_provider_data(
        &self,
        token: &AccessToken,
    ) -> Result<ProviderData, OAuthProviderError>;
}

/// Uid returned by [`FixtureOAuthProvider`] for every sign-in.
pub const FIXTURE_UID: &str = "123456";

/// Offline provider returning a fixed identity; used in development and tests.
#[derive(Debug, Clone)]
pub struct FixtureOAuthProvider {
    uid: String,
    name: String,
}

impl Default for FixtureOAuthProvider {
    fn default() -> Self {
        Self {
            uid: FIXTURE_UID.to_owned(),
            name: "Ada Lovelace".to_owned(),
        }
    }
}

impl FixtureOAuthProvider {
    /// Provider signing in a specific identity.
    pub fn with_identity(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl OAuthProvider for FixtureOAuthProvider {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Facebook
    }

    fn authorize_url(&self, state: &OAuthState) -> Result<Url, OAuthProviderError> {
        let mut url = Url::parse("http://localhost/api/v1/users/auth/facebook/callback")
            .map_err(|err| OAuthProviderError::invalid_payload(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("code", "fixture-code")
            .append_pair("state", state.as_ref());
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<OAuthIdentity, OAuthProviderError> {
        if code.expose() == "invalid" {
            return Err(OAuthProviderError::rejected("authorization code was refused"));
        }
        let uid = ProviderUid::new(self.uid.clone())
            .map_err(|err| OAuthProviderError::invalid_payload(err.to_string()))?;
        let name = DisplayName::new(self.name.clone())
            .map_err(|err| OAuthProviderError::invalid_payload(err.to_string()))?;
        Ok(OAuthIdentity {
            provider: AuthProvider::Facebook,
            uid,
            name,
            email: None,
            image: None,
            gender: None,
            locale: Some("en_US".to_owned()),
            birthday: None,
            link: None,
            credentials: ProviderCredentials {
                token: AccessToken::new(format!("fixture-token-{}", self.uid)),
                expires_at: Some(Utc::now() + Duration::days(60)),
            },
        })
    }

    async fn fetch_provider_data(
        &self,
        _token: &AccessToken,
    ) -> Result<ProviderData, OAuthProviderError> {
        Ok(ProviderData {
            friends_count: 3,
            likes: vec![ProviderLike {
                id: "1".to_owned(),
                name: "Carpooling".to_owned(),
            }],
        })
    }
}
