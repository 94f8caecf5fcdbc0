//! Facebook sign-in round trip against the fixture provider.

mod support;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::test;
use icare::domain::ports::FIXTURE_UID;
use icare::domain::ports::UserRepository;
use icare::test_support::memory_app;
use mockable::Clock;
use rstest::rstest;
use url::Url;

use support::{get_json, session_cookie};

fn location(res: &actix_web::dev::ServiceResponse) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_owned()
}

/// Callback path and query the fixture provider redirects to.
fn callback_target(authorize_location: &str) -> String {
    let url = Url::parse(authorize_location).expect("absolute redirect");
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

#[rstest]
#[actix_web::test]
async fn sign_in_creates_the_user_and_the_session() {
    let harness = memory_app();
    let app = test::init_service(harness.app()).await;

    let start = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/auth/facebook")
            .to_request(),
    )
    .await;
    assert_eq!(start.status(), StatusCode::FOUND);
    let pending: Cookie<'static> = session_cookie(&start);
    let callback = callback_target(&location(&start));
    assert!(callback.starts_with("/api/v1/users/auth/facebook/callback?"));

    let finish = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&callback)
            .cookie(pending)
            .to_request(),
    )
    .await;
    assert_eq!(finish.status(), StatusCode::FOUND);
    assert_eq!(location(&finish), "/dashboard");
    let signed_in = session_cookie(&finish);

    let (status, me) = get_json(&app, "/api/v1/users/me", &signed_in).await;
    assert_eq!(status, 200);
    assert_eq!(me["name"], "Ada Lovelace");
    assert_eq!(me["admin"], false);
    assert_eq!(me["unreadConversations"], 0);
}

#[rstest]
#[actix_web::test]
async fn tampered_state_redirects_home_with_a_flash() {
    let harness = memory_app();
    let app = test::init_service(harness.app()).await;

    let start = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/auth/facebook")
            .to_request(),
    )
    .await;
    let pending = session_cookie(&start);

    let finish = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/auth/facebook/callback?code=fixture-code&state=forged")
            .cookie(pending)
            .to_request(),
    )
    .await;
    assert_eq!(location(&finish), "/");
    let flashed = session_cookie(&finish);

    let (_, flash) = get_json(&app, "/api/v1/flash", &flashed).await;
    assert_eq!(flash["flash"]["error"], "flash.sessions.error.create");
}

#[rstest]
#[actix_web::test]
async fn banned_users_cannot_sign_in() {
    let harness = memory_app();
    let mut banned = harness.register(FIXTURE_UID, "Ada Lovelace").await;
    banned.set_banned(true, harness.clock.utc());
    harness.users.save(&banned).await.expect("store banned user");
    let app = test::init_service(harness.app()).await;

    let start = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/auth/facebook")
            .to_request(),
    )
    .await;
    let pending = session_cookie(&start);
    let finish = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&callback_target(&location(&start)))
            .cookie(pending)
            .to_request(),
    )
    .await;

    assert_eq!(location(&finish), "/");
    let (status, _) = get_json(&app, "/api/v1/users/me", &session_cookie(&finish)).await;
    assert_eq!(status, 401);
}
