//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod cache_control;
pub mod client_settings;
pub mod conversations;
pub mod error;
pub mod feedbacks;
pub mod health;
pub mod itineraries;
pub mod multiparam;
pub mod references;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::{Scope, web};

/// Every `/api/v1` handler with the extractor configs that turn malformed
/// input into `400` (or `404` for unparseable ids).
///
/// Literal segments are registered before the `{id}` routes they would
/// otherwise be captured by.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::form_config())
        .app_data(error::path_config())
        .service(client_settings::client_settings)
        .service(users::pop_flash)
        .service(auth::authorize)
        .service(auth::callback)
        .service(users::current_user)
        .service(users::sign_out)
        .service(references::list_references)
        .service(references::new_reference)
        .service(references::create_reference)
        .service(references::get_reference)
        .service(references::answer_reference)
        .service(users::get_user)
        .service(itineraries::create_itinerary)
        .service(itineraries::list_itineraries)
        .service(itineraries::search_itineraries)
        .service(itineraries::get_itinerary)
        .service(itineraries::delete_itinerary)
        .service(conversations::list_conversations)
        .service(conversations::new_conversation)
        .service(conversations::create_conversation)
        .service(conversations::unread_conversations)
        .service(conversations::unread_count)
        .service(conversations::get_conversation)
        .service(conversations::reply_to_conversation)
        .service(feedbacks::list_feedbacks)
        .service(feedbacks::create_feedback)
        .service(feedbacks::get_feedback)
        .service(feedbacks::update_feedback)
        .service(feedbacks::change_feedback_status)
}
