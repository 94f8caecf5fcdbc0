//! Facebook sign-in handlers.
//!
//! ```text
//! GET /api/v1/users/auth/facebook
//! GET /api/v1/users/auth/facebook/callback?code=..&state=..
//! ```
//!
//! Every failure on the callback path ends with a redirect to `/` carrying
//! the `flash.sessions.error.create` flash; browsers never see a JSON error.

use actix_web::{HttpResponse, get, http::header, web};
use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::IntoParams;

use crate::domain::{AuthorizationCode, Error, ErrorCode, OAuthState};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{Flash, SessionContext};
use crate::inbound::http::state::HttpState;

/// Localisation key of the flash shown after a failed sign-in.
pub const SIGN_IN_FAILED_FLASH: &str = "flash.sessions.error.create";
/// Landing page after a successful sign-in.
pub const AFTER_SIGN_IN_PATH: &str = "/dashboard";
/// Landing page after a failed sign-in.
pub const AFTER_FAILURE_PATH: &str = "/";

/// Query string the provider appends to the callback.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum CallbackRejection {
    #[error("provider reported {error}: {description}")]
    Provider { error: String, description: String },
    #[error("no sign-in was started in this session")]
    NoPendingState,
    #[error("state does not match the pending sign-in")]
    StateMismatch,
    #[error("authorization code missing")]
    MissingCode,
}

fn verify_callback(
    expected: Option<OAuthState>,
    params: CallbackParams,
) -> Result<AuthorizationCode, CallbackRejection> {
    if let Some(error) = params.error {
        return Err(CallbackRejection::Provider {
            error,
            description: params.error_description.unwrap_or_default(),
        });
    }
    let expected = expected.ok_or(CallbackRejection::NoPendingState)?;
    let echoed = params.state.ok_or(CallbackRejection::StateMismatch)?;
    if !expected.matches(&echoed) {
        return Err(CallbackRejection::StateMismatch);
    }
    params
        .code
        .and_then(|code| AuthorizationCode::new(code).ok())
        .ok_or(CallbackRejection::MissingCode)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn sign_in_failed(session: &SessionContext) -> ApiResult<HttpResponse> {
    session.set_flash(&Flash::error(SIGN_IN_FAILED_FLASH))?;
    Ok(redirect(AFTER_FAILURE_PATH))
}

/// Start the Facebook OAuth dance.
#[utoipa::path(
    get,
    path = "/api/v1/users/auth/facebook",
    responses(
        (status = 302, description = "Redirect to the provider", headers(("Location" = String, description = "Authorize URL"))),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "authorizeFacebook",
    security([])
)]
#[get("/users/auth/facebook")]
pub async fn authorize(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let oauth_state = OAuthState::generate();
    session.store_oauth_state(&oauth_state)?;
    let url = state.sign_in.authorize_url(&oauth_state)?;
    Ok(redirect(url.as_str()))
}

/// Finish the OAuth dance and establish the session.
#[utoipa::path(
    get,
    path = "/api/v1/users/auth/facebook/callback",
    params(CallbackParams),
    responses(
        (status = 302, description = "Redirect to the dashboard, or to / with a flash on failure", headers(("Location" = String, description = "Landing page"))),
    ),
    tags = ["auth"],
    operation_id = "facebookCallback",
    security([])
)]
#[get("/users/auth/facebook/callback")]
pub async fn callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<CallbackParams>,
) -> ApiResult<HttpResponse> {
    let expected = session.take_oauth_state()?;
    let code = match verify_callback(expected, params.into_inner()) {
        Ok(code) => code,
        Err(rejection) => {
            warn!(reason = %rejection, "oauth callback rejected");
            return sign_in_failed(&session);
        }
    };

    match state.sign_in.sign_in(&code).await {
        Ok(user) => {
            session.persist_user(user.id())?;
            info!(user_id = %user.id(), "user signed in");
            Ok(redirect(AFTER_SIGN_IN_PATH))
        }
        Err(err) => {
            log_sign_in_failure(&err);
            sign_in_failed(&session)
        }
    }
}

fn log_sign_in_failure(err: &Error) {
    match err.code() {
        ErrorCode::InternalError | ErrorCode::ServiceUnavailable => {
            error!(code = ?err.code(), message = err.message(), "sign-in failed");
        }
        _ => warn!(code = ?err.code(), message = err.message(), "sign-in refused"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FIXTURE_UID;
    use crate::domain::{DisplayName, OAuthIdentity, ProviderCredentials, ProviderUid, User};
    use crate::domain::{AccessToken, AuthProvider};
    use crate::inbound::http::test_utils::{TestPorts, session_cookie, test_app};
    use crate::test_support::fixture_timestamp;
    use actix_web::http::StatusCode;
    use actix_web::test::{self};
    use rstest::rstest;
    use url::Url;

    fn fixture_user() -> User {
        let identity = OAuthIdentity {
            provider: AuthProvider::Facebook,
            uid: ProviderUid::new(FIXTURE_UID).expect("uid"),
            name: DisplayName::new("Ada Lovelace").expect("name"),
            email: None,
            image: None,
            gender: None,
            locale: None,
            birthday: None,
            link: None,
            credentials: ProviderCredentials {
                token: AccessToken::new("token"),
                expires_at: None,
            },
        };
        User::from_identity(&identity, fixture_timestamp())
    }

    fn params(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_owned),
            state: state.map(str::to_owned),
            ..CallbackParams::default()
        }
    }

    #[rstest]
    fn matching_state_yields_the_code() {
        let state = OAuthState::from_stored("abc");
        let code = verify_callback(Some(state), params(Some("xyz"), Some("abc")))
            .expect("valid callback");
        assert_eq!(code.expose(), "xyz");
    }

    #[rstest]
    #[case(None, params(Some("xyz"), Some("abc")), CallbackRejection::NoPendingState)]
    #[case(Some("abc"), params(Some("xyz"), Some("abd")), CallbackRejection::StateMismatch)]
    #[case(Some("abc"), params(Some("xyz"), None), CallbackRejection::StateMismatch)]
    #[case(Some("abc"), params(None, Some("abc")), CallbackRejection::MissingCode)]
    #[case(Some("abc"), params(Some("  "), Some("abc")), CallbackRejection::MissingCode)]
    fn broken_callbacks_are_rejected(
        #[case] stored: Option<&str>,
        #[case] params: CallbackParams,
        #[case] expected: CallbackRejection,
    ) {
        let rejection = verify_callback(stored.map(OAuthState::from_stored), params)
            .expect_err("rejected");
        assert_eq!(rejection, expected);
    }

    #[rstest]
    fn provider_errors_win() {
        let params = CallbackParams {
            error: Some("access_denied".to_owned()),
            ..params(Some("xyz"), Some("abc"))
        };
        let rejection = verify_callback(Some(OAuthState::from_stored("abc")), params)
            .expect_err("provider error");
        assert!(matches!(rejection, CallbackRejection::Provider { .. }));
    }

    fn location<B>(res: &actix_web::dev::ServiceResponse<B>) -> String {
        res.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("location header")
            .to_owned()
    }

    fn echoed_state(location: &str) -> String {
        Url::parse(location)
            .expect("absolute authorize url")
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state in authorize url")
    }

    fn ports_with_sign_in(result: Result<User, Error>) -> TestPorts {
        let mut ports = TestPorts::default();
        ports.sign_in.expect_authorize_url().returning(|state| {
            let mut url = Url::parse("https://www.facebook.com/dialog/oauth").expect("url");
            url.query_pairs_mut().append_pair("state", state.as_ref());
            Ok(url)
        });
        ports
            .sign_in
            .expect_sign_in()
            .times(0..=1)
            .return_once(move |_| result);
        ports
    }

    #[actix_web::test]
    async fn successful_sign_in_lands_on_the_dashboard() {
        let app = test::init_service(test_app(ports_with_sign_in(Ok(fixture_user())))).await;

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/users/auth/facebook").to_request(),
        )
        .await;
        assert_eq!(start.status(), StatusCode::FOUND);
        let state = echoed_state(&location(&start));
        let cookie = session_cookie(&start);

        let done = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!(
                    "/api/v1/users/auth/facebook/callback?code=ok&state={state}"
                ))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(done.status(), StatusCode::FOUND);
        assert_eq!(location(&done), AFTER_SIGN_IN_PATH);
    }

    #[actix_web::test]
    async fn refused_sign_in_redirects_home_with_flash() {
        let app = test::init_service(test_app(ports_with_sign_in(Err(Error::forbidden(
            "account suspended",
        )))))
        .await;

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/users/auth/facebook").to_request(),
        )
        .await;
        let state = echoed_state(&location(&start));
        let done = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!(
                    "/api/v1/users/auth/facebook/callback?code=ok&state={state}"
                ))
                .cookie(session_cookie(&start))
                .to_request(),
        )
        .await;
        assert_eq!(location(&done), AFTER_FAILURE_PATH);

        let flash = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/flash")
                .cookie(session_cookie(&done))
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(flash).await;
        assert_eq!(body["flash"]["error"], SIGN_IN_FAILED_FLASH);
    }

    #[actix_web::test]
    async fn callback_without_pending_state_fails() {
        let app = test::init_service(test_app(ports_with_sign_in(Err(Error::internal(
            "never called",
        )))))
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/auth/facebook/callback?code=ok&state=forged")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), AFTER_FAILURE_PATH);
    }
}
