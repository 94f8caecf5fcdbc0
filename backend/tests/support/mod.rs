//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; each
//! one pulls this module in with `mod support;`.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use icare::domain::UserId;
use icare::test_support::login_request;
use serde::Serialize;
use serde_json::Value;

/// Extract the session cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Log `user_id` in through the harness shortcut and return the cookie.
pub async fn sign_in<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, login_request(user_id).to_request()).await;
    assert!(res.status().is_success(), "login shortcut failed");
    session_cookie(&res)
}

/// Ride form as posted by the browser; leaves on 25 April 2026.
pub fn ischia_ride_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("title", "Ischia to Naples"),
        ("description", "Morning ferry, room for luggage"),
        ("start_address", "Ischia Porto"),
        ("start_location", "40.7369, 13.9488"),
        ("end_address", "Napoli Beverello"),
        ("end_location", "40.8377, 14.2551"),
        ("leave_date", "2026-04-25T07:30:00Z"),
        ("num_people", "3"),
        ("fuel_cost", "5"),
        ("pets_allowed", "1"),
    ]
}

/// GET `uri` with `cookie`, returning status and JSON body.
pub async fn get_json<S>(app: &S, uri: &str, cookie: &Cookie<'static>) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Accept", "application/json"))
        .cookie(cookie.clone())
        .to_request();
    read(test::call_service(app, req).await).await
}

/// Send `body` as JSON with `method`, returning status and JSON body.
pub async fn send_json<S, T>(
    app: &S,
    req: test::TestRequest,
    cookie: &Cookie<'static>,
    body: &T,
) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    T: Serialize,
{
    let req = req.cookie(cookie.clone()).set_json(body).to_request();
    read(test::call_service(app, req).await).await
}

async fn read(res: ServiceResponse) -> (u16, Value) {
    let status = res.status().as_u16();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}
