//! Driving port for social sign-in.
//!
//! Inbound adapters call this port from the OAuth endpoints; the service
//! behind it talks to the provider, finds or creates the user and schedules
//! the provider-data refresh.

use async_trait::async_trait;
use url::Url;

use crate::domain::{AuthorizationCode, Error, OAuthState, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignInCommand: Send + Sync {
    /// Provider URL the browser should visit to start signing in.
    fn authorize_url(&self, state: &OAuthState) -> Result<Url, Error>;

    /// Complete the handshake and return the signed-in user.
    ///
    /// Fails with `forbidden` for banned users and with `unauthorized` when
    /// the provider refuses the code.
    async fn sign_in(&self, code: &AuthorizationCode) -> Result<User, Error>;
}
