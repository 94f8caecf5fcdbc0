//! Reqwest-backed Facebook OAuth adapter.
//!
//! This adapter owns transport details only: building the dialog URL, the
//! code-for-token exchange, profile reads and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::dto::{FriendsDto, GraphErrorDto, LikesDto, ProfileDto, TokenDto};
use crate::domain::ports::{OAuthProvider, OAuthProviderError};
use crate::domain::{
    AccessToken, AuthProvider, AuthorizationCode, DisplayName, OAuthIdentity, OAuthState,
    ProviderCredentials, ProviderData, ProviderUid,
};
use crate::settings::FacebookCredentials;

const PROFILE_FIELDS: &str = "id,name,email,gender,locale,birthday,link";
const REQUESTED_SCOPE: &str = "email";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `OAuthProvider` talking to the Facebook dialog and Graph API.
pub struct FacebookGraphProvider {
    client: Client,
    credentials: FacebookCredentials,
}

impl FacebookGraphProvider {
    /// Build the adapter with a ten second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(credentials: FacebookCredentials) -> Result<Self, reqwest::Error> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        credentials: FacebookCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn graph_url(&self, path: &str) -> Result<Url, OAuthProviderError> {
        self.credentials
            .graph_base_url
            .join(path)
            .map_err(|err| OAuthProviderError::invalid_payload(format!("graph url: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, OAuthProviderError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|err| {
            OAuthProviderError::invalid_payload(format!("invalid Graph API payload: {err}"))
        })
    }
}

#[async_trait]
impl OAuthProvider for FacebookGraphProvider {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Facebook
    }

    fn authorize_url(&self, state: &OAuthState) -> Result<Url, OAuthProviderError> {
        let mut url = self.credentials.dialog_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.credentials.app_id)
            .append_pair("redirect_uri", self.credentials.callback_url.as_str())
            .append_pair("scope", REQUESTED_SCOPE)
            .append_pair("response_type", "code")
            .append_pair("state", state.as_ref());
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<OAuthIdentity, OAuthProviderError> {
        let token: TokenDto = self
            .get_json(
                self.graph_url("oauth/access_token")?,
                &[
                    ("client_id", self.credentials.app_id.as_str()),
                    ("client_secret", self.credentials.secret.as_str()),
                    ("redirect_uri", self.credentials.callback_url.as_str()),
                    ("code", code.expose()),
                ],
            )
            .await?;
        let access_token = AccessToken::new(token.access_token);
        let expires_at = token
            .expires_in
            .and_then(chrono::Duration::try_seconds)
            .map(|ttl| Utc::now() + ttl);

        let profile: ProfileDto = self
            .get_json(
                self.graph_url("me")?,
                &[
                    ("fields", PROFILE_FIELDS),
                    ("access_token", access_token.expose()),
                ],
            )
            .await?;
        tracing::debug!(uid = %profile.id, "facebook profile fetched");
        identity_from_profile(profile, access_token, expires_at, &self.credentials.graph_base_url)
    }

    async fn fetch_provider_data(
        &self,
        token: &AccessToken,
    ) -> Result<ProviderData, OAuthProviderError> {
        let friends: FriendsDto = self
            .get_json(
                self.graph_url("me/friends")?,
                &[("limit", "0"), ("access_token", token.expose())],
            )
            .await?;
        let likes: LikesDto = self
            .get_json(
                self.graph_url("me/likes")?,
                &[("fields", "id,name"), ("access_token", token.expose())],
            )
            .await?;
        Ok(ProviderData {
            friends_count: friends.summary.map_or(0, |summary| summary.total_count),
            likes: likes.data.into_iter().map(Into::into).collect(),
        })
    }
}

fn identity_from_profile(
    profile: ProfileDto,
    token: AccessToken,
    expires_at: Option<chrono::DateTime<Utc>>,
    graph_base_url: &Url,
) -> Result<OAuthIdentity, OAuthProviderError> {
    let birthday = profile.birthday();
    let uid = ProviderUid::new(profile.id)
        .map_err(|err| OAuthProviderError::invalid_payload(err.to_string()))?;
    let name = DisplayName::new(profile.name)
        .map_err(|err| OAuthProviderError::invalid_payload(err.to_string()))?;
    let image = graph_base_url
        .join(&format!("{uid}/picture?type=square"))
        .ok()
        .map(String::from);
    Ok(OAuthIdentity {
        provider: AuthProvider::Facebook,
        uid,
        name,
        email: profile.email,
        image,
        gender: profile.gender,
        locale: profile.locale,
        birthday,
        link: profile.link,
        credentials: ProviderCredentials {
            token,
            expires_at,
        },
    })
}

fn map_transport_error(error: reqwest::Error) -> OAuthProviderError {
    if error.is_timeout() {
        OAuthProviderError::transport("request to Facebook timed out")
    } else {
        OAuthProviderError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> OAuthProviderError {
    let message = serde_json::from_slice::<GraphErrorDto>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("unexpected status {status}"));
    if status.is_server_error() {
        OAuthProviderError::transport(message)
    } else {
        OAuthProviderError::rejected(message)
    }
}
