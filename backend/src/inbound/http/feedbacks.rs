//! Feedback HTTP handlers.
//!
//! ```text
//! GET /api/v1/feedbacks
//! POST /api/v1/feedbacks             {"type":"bug","message":"...","url":null}
//! GET /api/v1/feedbacks/{id}
//! PUT /api/v1/feedbacks/{id}
//! PATCH /api/v1/feedbacks/{id}/status {"status":"fixed"}
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, patch, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Error, Feedback, FeedbackContent, FeedbackId, FeedbackMessage, FeedbackStatus, FeedbackType,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserDirectory;
use crate::inbound::http::validation::feedback_error;

/// Body of `POST` and `PUT` requests.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FeedbackRequest {
    /// `bug` (default) or `idea`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub message: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl TryFrom<FeedbackRequest> for FeedbackContent {
    type Error = Error;

    fn try_from(request: FeedbackRequest) -> Result<Self, Self::Error> {
        let kind = request
            .kind
            .as_deref()
            .map(FeedbackType::from_str)
            .transpose()
            .map_err(feedback_error)?
            .unwrap_or_default();
        let message = FeedbackMessage::new(request.message).map_err(feedback_error)?;
        let url = request.url.filter(|url| !url.trim().is_empty());
        Ok(Self { kind, message, url })
    }
}

/// Body of `PATCH .../status`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FeedbackStatusRequest {
    /// `open`, `fixed`, `in progress` or `not applicable`.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub message: String,
    pub url: Option<String>,
    pub status: FeedbackStatus,
    pub fixed: bool,
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    /// `None` once the author's account is gone.
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackResponse {
    fn new(feedback: &Feedback, users: &UserDirectory) -> Self {
        let content = feedback.content();
        Self {
            id: feedback.id().to_string(),
            kind: content.kind,
            message: content.message.as_ref().to_owned(),
            url: content.url.clone(),
            status: feedback.status(),
            fixed: feedback.is_fixed(),
            user_id: feedback.user_id().map(ToString::to_string),
            user_name: feedback.user_id().map(|id| users.name(id)),
            created_at: feedback.created_at(),
            updated_at: feedback.updated_at(),
        }
    }
}

async fn render(state: &HttpState, feedbacks: &[Feedback]) -> ApiResult<Vec<FeedbackResponse>> {
    let users = UserDirectory::resolve(state, feedbacks.iter().filter_map(Feedback::user_id)).await?;
    Ok(feedbacks
        .iter()
        .map(|feedback| FeedbackResponse::new(feedback, &users))
        .collect())
}

async fn render_one(state: &HttpState, feedback: Feedback) -> ApiResult<FeedbackResponse> {
    render(state, std::slice::from_ref(&feedback))
        .await?
        .pop()
        .ok_or_else(|| Error::internal("feedback vanished while rendering"))
}

/// All feedback, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/feedbacks",
    responses(
        (status = 200, description = "Feedback", body = [FeedbackResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "listFeedbacks"
)]
#[get("/feedbacks")]
pub async fn list_feedbacks(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<FeedbackResponse>>> {
    session.require_user_id()?;
    let feedbacks = state.feedbacks_query.list().await?;
    Ok(web::Json(render(&state, &feedbacks).await?))
}

/// Report a bug or suggest an idea.
#[utoipa::path(
    post,
    path = "/api/v1/feedbacks",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback submitted", body = FeedbackResponse),
        (status = 400, description = "Invalid type or empty message", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "createFeedback"
)]
#[post("/feedbacks")]
pub async fn create_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let content = FeedbackContent::try_from(payload.into_inner())?;
    let feedback = state.feedbacks.submit(&user_id, content).await?;
    Ok(HttpResponse::Created().json(render_one(&state, feedback).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "Feedback", body = FeedbackResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "getFeedback"
)]
#[get("/feedbacks/{id}")]
pub async fn get_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<FeedbackResponse>> {
    session.require_user_id()?;
    let feedback = state
        .feedbacks_query
        .get(FeedbackId::from_uuid(path.into_inner()))
        .await?;
    Ok(web::Json(render_one(&state, feedback).await?))
}

/// Edit type, message and url; owners and administrators only.
#[utoipa::path(
    put,
    path = "/api/v1/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback id")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Updated feedback", body = FeedbackResponse),
        (status = 400, description = "Invalid type or empty message", body = Error),
        (status = 403, description = "Neither owner nor administrator", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "updateFeedback"
)]
#[put("/feedbacks/{id}")]
pub async fn update_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<web::Json<FeedbackResponse>> {
    let user_id = session.require_user_id()?;
    let content = FeedbackContent::try_from(payload.into_inner())?;
    let feedback = state
        .feedbacks
        .edit(&user_id, FeedbackId::from_uuid(path.into_inner()), content)
        .await?;
    Ok(web::Json(render_one(&state, feedback).await?))
}

/// Triage a feedback; administrators only.
#[utoipa::path(
    patch,
    path = "/api/v1/feedbacks/{id}/status",
    params(("id" = Uuid, Path, description = "Feedback id")),
    request_body = FeedbackStatusRequest,
    responses(
        (status = 200, description = "Updated feedback", body = FeedbackResponse),
        (status = 400, description = "Unknown status", body = Error),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "changeFeedbackStatus"
)]
#[patch("/feedbacks/{id}/status")]
pub async fn change_feedback_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<FeedbackStatusRequest>,
) -> ApiResult<web::Json<FeedbackResponse>> {
    let user_id = session.require_user_id()?;
    let status = FeedbackStatus::from_str(&payload.status).map_err(feedback_error)?;
    let feedback = state
        .feedbacks
        .change_status(&user_id, FeedbackId::from_uuid(path.into_inner()), status)
        .await?;
    Ok(web::Json(render_one(&state, feedback).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{TestPorts, login_request, session_cookie, test_app};
    use crate::test_support::fixture_timestamp;
    use actix_web::http::StatusCode;
    use actix_web::test::{self};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn request(kind: Option<&str>, message: &str) -> FeedbackRequest {
        FeedbackRequest {
            kind: kind.map(str::to_owned),
            message: message.to_owned(),
            url: None,
        }
    }

    #[rstest]
    fn type_defaults_to_bug() {
        let content = FeedbackContent::try_from(request(None, "Map is blank")).expect("valid");
        assert_eq!(content.kind, FeedbackType::Bug);
    }

    #[rstest]
    #[case(request(Some("rant"), "Too slow"), "type")]
    #[case(request(Some("idea"), "  "), "message")]
    fn invalid_content_names_the_field(#[case] request: FeedbackRequest, #[case] field: &str) {
        let err = FeedbackContent::try_from(request).expect_err("invalid");
        assert_eq!(err.details().expect("details")["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn submitting_returns_201_with_the_author_name() {
        let author = UserId::random();
        let mut ports = TestPorts::default();
        ports.feedbacks.expect_submit().return_once(|user_id, content| {
            Ok(Feedback::submit(user_id.clone(), content, fixture_timestamp()))
        });
        ports.users.expect_find_users().returning(|_| Ok(Vec::new()));
        let app = test::init_service(test_app(ports)).await;
        let login = test::call_service(&app, login_request(&author).to_request()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/feedbacks")
                .cookie(session_cookie(&login))
                .set_json(json!({ "message": "Search ignores the radius" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["type"], "bug");
        assert_eq!(body["status"], "open");
        assert_eq!(body["fixed"], false);
        assert_eq!(body["userId"], author.to_string());
        assert_eq!(body["userName"], "Unknown user");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_statuses_are_rejected() {
        let app = test::init_service(test_app(TestPorts::default())).await;
        let login = test::call_service(&app, login_request(&UserId::random()).to_request()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/v1/feedbacks/{}/status", Uuid::new_v4()))
                .cookie(session_cookie(&login))
                .set_json(json!({ "status": "wontfix" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "status");
    }

    #[rstest]
    #[actix_web::test]
    async fn non_admins_cannot_triage() {
        let mut ports = TestPorts::default();
        ports
            .feedbacks
            .expect_change_status()
            .return_once(|_, _, _| Err(Error::forbidden("administrators only")));
        let app = test::init_service(test_app(ports)).await;
        let login = test::call_service(&app, login_request(&UserId::random()).to_request()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/api/v1/feedbacks/{}/status", Uuid::new_v4()))
                .cookie(session_cookie(&login))
                .set_json(json!({ "status": "fixed" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
