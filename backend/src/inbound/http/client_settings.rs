//! Public client configuration.
//!
//! ```text
//! GET /api/v1/settings
//! ```

use actix_web::{HttpResponse, get, web};

use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::state::HttpState;
use crate::settings::PublicSettings;

/// Settings the browser client needs to render maps and forms.
///
/// Available without a session; credentials never appear here.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses((status = 200, description = "Client settings", body = PublicSettings)),
    tags = ["settings"],
    operation_id = "clientSettings",
    security([])
)]
#[get("/settings")]
pub async fn client_settings(state: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(no_store_header())
        .json(state.settings.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestPorts, test_app};
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn settings_are_public_and_uncached() {
        let app = test::init_service(test_app(TestPorts::default())).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/settings").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["appName"], "Icare");
        assert_eq!(body["map"]["zoom"], 8);
        assert_eq!(body["advertising"], false);
        assert!(body.get("facebook").is_none());
    }
}
