//! Conversation HTTP handlers.
//!
//! ```text
//! GET /api/v1/conversations
//! GET /api/v1/conversations/new?itinerary_id=..
//! POST /api/v1/conversations?itinerary_id=..   {"message":{"body":"..."}}
//! GET /api/v1/conversations/unread
//! GET /api/v1/conversations/unread/count
//! GET /api/v1/conversations/{id}
//! PUT /api/v1/conversations/{id}               {"message":{"body":"..."}}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, http::header, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::ConversationStart;
use crate::domain::{
    Conversable, Conversation, ConversationId, Error, ErrorCode, ItineraryId, Message,
    MessageBody, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::itineraries::ItinerarySummary;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{UserDirectory, UserSummary};
use crate::inbound::http::validation::{FieldName, body_error, missing_field_error, parse_uuid};

const CONVERSATIONS_PATH: &str = "/api/v1/conversations";

/// Body of `POST` and `PUT` requests.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MessageRequest {
    pub message: MessageFields,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MessageFields {
    pub body: String,
}

impl MessageRequest {
    fn into_body(self) -> ApiResult<MessageBody> {
        MessageBody::new(self.message.body)
            .map_err(|err| body_error(FieldName::new("message.body"), err))
    }
}

/// Query selecting the itinerary a conversation is about.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ItineraryParams {
    pub itinerary_id: Option<String>,
}

impl ItineraryParams {
    pub(crate) fn itinerary_id(self) -> ApiResult<ItineraryId> {
        let field = FieldName::new("itinerary_id");
        let raw = self.itinerary_id.ok_or_else(|| missing_field_error(field))?;
        Ok(ItineraryId::from_uuid(parse_uuid(&raw, field)?))
    }
}

/// What a conversation is attached to.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversableResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(format = "uuid")]
    pub id: String,
}

impl From<Conversable> for ConversableResponse {
    fn from(value: Conversable) -> Self {
        Self {
            kind: value.type_name().to_owned(),
            id: value.id().to_string(),
        }
    }
}

/// One message with its sender's name. The body is returned verbatim.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub sender_id: String,
    pub sender_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl MessageResponse {
    fn new(message: &Message, users: &UserDirectory) -> Self {
        Self {
            id: message.id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_name: users.name(&message.sender_id),
            body: message.body.as_ref().to_owned(),
            created_at: message.created_at,
        }
    }
}

/// Conversation as shown in the inbox and the navbar popover.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub conversable: ConversableResponse,
    pub participants: Vec<UserSummary>,
    pub last_message: Option<MessageResponse>,
    pub unread: bool,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSummaryResponse {
    fn new(conversation: &Conversation, viewer: &UserId, users: &UserDirectory) -> Self {
        Self {
            id: conversation.id().to_string(),
            conversable: conversation.conversable().into(),
            participants: participants(conversation, users),
            last_message: conversation
                .last_message()
                .map(|message| MessageResponse::new(message, users)),
            unread: conversation.is_unread_for(viewer),
            updated_at: conversation.updated_at(),
        }
    }
}

/// Conversation with every message.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    #[schema(format = "uuid")]
    pub id: String,
    pub conversable: ConversableResponse,
    /// `None` once the itinerary has been withdrawn.
    pub itinerary: Option<ItinerarySummary>,
    pub participants: Vec<UserSummary>,
    pub messages: Vec<MessageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft returned by `GET /api/v1/conversations/new`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationDraftResponse {
    pub itinerary: ItinerarySummary,
    pub recipient: UserSummary,
}

/// Number of conversations with unread messages.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: usize,
}

fn participants(conversation: &Conversation, users: &UserDirectory) -> Vec<UserSummary> {
    conversation
        .participants()
        .iter()
        .map(|participant| users.summary(&participant.user_id))
        .collect()
}

fn user_ids(conversations: &[Conversation]) -> impl Iterator<Item = &UserId> {
    conversations.iter().flat_map(|conversation| {
        conversation
            .participants()
            .iter()
            .map(|participant| &participant.user_id)
    })
}

async fn summaries(
    state: &HttpState,
    viewer: &UserId,
    conversations: &[Conversation],
) -> ApiResult<Vec<ConversationSummaryResponse>> {
    let users = UserDirectory::resolve(state, user_ids(conversations)).await?;
    Ok(conversations
        .iter()
        .map(|conversation| ConversationSummaryResponse::new(conversation, viewer, &users))
        .collect())
}

async fn full(state: &HttpState, conversation: &Conversation) -> ApiResult<ConversationResponse> {
    let users = UserDirectory::resolve(state, user_ids(std::slice::from_ref(conversation))).await?;
    let itinerary = match conversation.conversable() {
        Conversable::Itinerary(id) => match state.itineraries_query.get(id).await {
            Ok(itinerary) => Some(ItinerarySummary::from(&itinerary)),
            Err(err) if err.code() == ErrorCode::NotFound => None,
            Err(err) => return Err(err),
        },
    };
    Ok(ConversationResponse {
        id: conversation.id().to_string(),
        conversable: conversation.conversable().into(),
        itinerary,
        participants: participants(conversation, &users),
        messages: conversation
            .messages()
            .iter()
            .map(|message| MessageResponse::new(message, &users))
            .collect(),
        created_at: conversation.created_at(),
        updated_at: conversation.updated_at(),
    })
}

fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// The signed-in user's conversations, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    responses(
        (status = 200, description = "Conversations", body = [ConversationSummaryResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "listConversations"
)]
#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let conversations = state.conversations_query.list(&user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(summaries(&state, &user_id, &conversations).await?))
}

/// Draft a conversation, or redirect to the one that already exists.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/new",
    params(ItineraryParams),
    responses(
        (status = 200, description = "Draft", body = ConversationDraftResponse),
        (status = 303, description = "Existing conversation", headers(("Location" = String, description = "Conversation URL"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Own itinerary", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "newConversation"
)]
#[get("/conversations/new")]
pub async fn new_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ItineraryParams>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let itinerary_id = params.into_inner().itinerary_id()?;
    match state
        .conversations_query
        .prepare(&user_id, itinerary_id)
        .await?
    {
        ConversationStart::Existing(id) => Ok(see_other(&format!("{CONVERSATIONS_PATH}/{id}"))),
        ConversationStart::Draft(itinerary) => {
            let users = UserDirectory::resolve(&state, [itinerary.driver_id()]).await?;
            Ok(HttpResponse::Ok().json(ConversationDraftResponse {
                recipient: users.summary(itinerary.driver_id()),
                itinerary: ItinerarySummary::from(&itinerary),
            }))
        }
    }
}

/// Ask the driver about an itinerary.
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    params(ItineraryParams),
    request_body = MessageRequest,
    responses(
        (status = 201, description = "Conversation started", body = ConversationResponse),
        (status = 400, description = "Empty message", body = Error),
        (status = 403, description = "Own itinerary", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error),
        (status = 409, description = "Conversation already exists", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "createConversation"
)]
#[post("/conversations")]
pub async fn create_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ItineraryParams>,
    payload: web::Json<MessageRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let itinerary_id = params.into_inner().itinerary_id()?;
    let body = payload.into_inner().into_body()?;
    let conversation = state
        .conversations
        .start(&user_id, itinerary_id, body)
        .await?;
    Ok(HttpResponse::Created().json(full(&state, &conversation).await?))
}

/// Unread conversations for the navbar popover.
///
/// Page requests are redirected to the inbox; only JSON requests get data.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/unread",
    responses(
        (status = 200, description = "Unread conversations", body = [ConversationSummaryResponse]),
        (status = 303, description = "Page request redirected to the inbox"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "unreadConversations"
)]
#[get("/conversations/unread")]
pub async fn unread_conversations(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    if !wants_json(&req) {
        return Ok(see_other(CONVERSATIONS_PATH));
    }
    let conversations = state.conversations_query.list_unread(&user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(summaries(&state, &user_id, &conversations).await?))
}

/// Unread badge count.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/unread/count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "unreadConversationCount"
)]
#[get("/conversations/unread/count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let count = state.conversations_query.unread_count(&user_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(UnreadCountResponse { count }))
}

/// Read a conversation; marks it read for the viewer.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    params(("id" = Uuid, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation", body = ConversationResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found or not a participant", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "getConversation"
)]
#[get("/conversations/{id}")]
pub async fn get_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let conversation = state
        .conversations
        .view(&user_id, ConversationId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(full(&state, &conversation).await?))
}

/// Reply to a conversation.
#[utoipa::path(
    put,
    path = "/api/v1/conversations/{id}",
    params(("id" = Uuid, Path, description = "Conversation id")),
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Conversation with the new message", body = ConversationResponse),
        (status = 400, description = "Empty message", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found or not a participant", body = Error)
    ),
    tags = ["conversations"],
    operation_id = "replyToConversation"
)]
#[put("/conversations/{id}")]
pub async fn reply_to_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<MessageRequest>,
) -> ApiResult<web::Json<ConversationResponse>> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner().into_body()?;
    let conversation = state
        .conversations
        .reply(&user_id, ConversationId::from_uuid(path.into_inner()), body)
        .await?;
    Ok(web::Json(full(&state, &conversation).await?))
}

#[cfg(test)]
#[path = "conversations_tests.rs"]
mod tests;
