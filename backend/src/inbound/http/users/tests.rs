//! Tests for users API handlers.

use super::*;
use crate::domain::{
    AccessToken, AuthProvider, DisplayName, OAuthIdentity, ProviderCredentials, ProviderUid,
};
use crate::inbound::http::test_utils::{TestPorts, login_request, session_cookie, test_app};
use crate::test_support::fixture_timestamp;
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::{fixture, rstest};
use serde_json::Value;

#[fixture]
fn user() -> User {
    let identity = OAuthIdentity {
        provider: AuthProvider::Facebook,
        uid: ProviderUid::new("42").expect("uid"),
        name: DisplayName::new("Grace Hopper").expect("name"),
        email: Some("grace@example.com".to_owned()),
        image: Some("https://graph.facebook.com/42/picture".to_owned()),
        gender: None,
        locale: Some("en_GB".to_owned()),
        birthday: None,
        link: None,
        credentials: ProviderCredentials {
            token: AccessToken::new("token"),
            expires_at: None,
        },
    };
    User::from_identity(&identity, fixture_timestamp())
}

#[rstest]
#[actix_web::test]
async fn me_requires_a_session() {
    let app = test::init_service(test_app(TestPorts::default())).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/users/me").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn me_includes_the_unread_badge(user: User) {
    let user_id = user.id().clone();
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_find_user()
        .return_once(move |_| Ok(user));
    ports
        .conversations_query
        .expect_unread_count()
        .return_once(|_| Ok(1));
    let app = test::init_service(test_app(ports)).await;

    let login = test::call_service(&app, login_request(&user_id).to_request()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(session_cookie(&login))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["name"], "Grace Hopper");
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["unreadConversations"], 1);
    assert_eq!(body["admin"], false);
}

#[rstest]
#[actix_web::test]
async fn public_profile_carries_reference_counts(user: User) {
    let viewer = UserId::random();
    let user_id = user.id().clone();
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_find_user()
        .return_once(move |_| Ok(user));
    ports
        .references_query
        .expect_summary()
        .return_once(|_| {
            Ok(ReferenceSummary {
                positive: 2,
                neutral: 1,
                negative: 0,
            })
        });
    let app = test::init_service(test_app(ports)).await;

    let login = test::call_service(&app, login_request(&viewer).to_request()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/users/{user_id}"))
            .cookie(session_cookie(&login))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["references"]["positive"], 2);
    assert_eq!(body["references"]["neutral"], 1);
    assert!(body.get("email").is_none());
}

#[rstest]
#[actix_web::test]
async fn sign_out_forgets_the_user() {
    let app = test::init_service(test_app(TestPorts::default())).await;
    let login = test::call_service(&app, login_request(&UserId::random()).to_request()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/users/sign_out")
            .cookie(session_cookie(&login))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie cleared");
    assert_eq!(cleared.value(), "");
}

#[rstest]
#[actix_web::test]
async fn flash_is_null_without_a_pending_message() {
    let app = test::init_service(test_app(TestPorts::default())).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/flash").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, serde_json::json!({ "flash": null }));
}
