//! Feedback submitted by users and triaged by administrators.

mod support;

use actix_web::test;
use icare::test_support::memory_app;
use rstest::rstest;
use serde_json::json;

use support::{get_json, send_json, sign_in};

#[rstest]
#[actix_web::test]
async fn only_admins_change_the_status_of_feedback() {
    let harness = memory_app();
    let reporter = harness.register("4001", "Rita Reporter").await;
    let admin = harness.register_admin("4002", "Alba Admin").await;
    let app = test::init_service(harness.app()).await;
    let reporter_cookie = sign_in(&app, reporter.id()).await;
    let admin_cookie = sign_in(&app, admin.id()).await;

    let (status, feedback) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/feedbacks"),
        &reporter_cookie,
        &json!({ "type": "bug", "message": "Search ignores the pink filter" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(feedback["status"], "open");
    assert_eq!(feedback["userName"], "Rita Reporter");
    let status_uri = format!(
        "/api/v1/feedbacks/{}/status",
        feedback["id"].as_str().expect("feedback id")
    );

    let (status, _) = send_json(
        &app,
        test::TestRequest::patch().uri(&status_uri),
        &reporter_cookie,
        &json!({ "status": "fixed" }),
    )
    .await;
    assert_eq!(status, 403);

    let (status, fixed) = send_json(
        &app,
        test::TestRequest::patch().uri(&status_uri),
        &admin_cookie,
        &json!({ "status": "fixed" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(fixed["fixed"], true);

    let (status, listed) = get_json(&app, "/api/v1/feedbacks", &reporter_cookie).await;
    assert_eq!(status, 200);
    assert_eq!(listed[0]["status"], "fixed");
}

#[rstest]
#[actix_web::test]
async fn authors_edit_but_strangers_do_not() {
    let harness = memory_app();
    let author = harness.register("5001", "Rita Reporter").await;
    let stranger = harness.register("5002", "Sergio Stranger").await;
    let app = test::init_service(harness.app()).await;
    let author_cookie = sign_in(&app, author.id()).await;
    let stranger_cookie = sign_in(&app, stranger.id()).await;

    let (_, feedback) = send_json(
        &app,
        test::TestRequest::post().uri("/api/v1/feedbacks"),
        &author_cookie,
        &json!({ "type": "idea", "message": "Show fuel cost per passenger" }),
    )
    .await;
    let uri = format!(
        "/api/v1/feedbacks/{}",
        feedback["id"].as_str().expect("feedback id")
    );
    let edit = json!({ "type": "idea", "message": "Show fuel cost per seat" });

    let (status, _) = send_json(
        &app,
        test::TestRequest::put().uri(&uri),
        &stranger_cookie,
        &edit,
    )
    .await;
    assert_eq!(status, 403);

    let (status, edited) =
        send_json(&app, test::TestRequest::put().uri(&uri), &author_cookie, &edit).await;
    assert_eq!(status, 200);
    assert_eq!(edited["message"], "Show fuel cost per seat");
}
