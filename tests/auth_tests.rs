// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, logout and session cookie tests against a mock Garmin server.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

use common::{TEST_EMAIL, TEST_PASSWORD};

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (garmin_url, mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, state) = common::create_test_app(&garmin_url);

    let response = common::login(&app, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "garmin_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=43200"));
    assert!(!cookie.contains("Secure"));

    let body = common::body_json(response).await;
    let token = body["token"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("garmin_token={token}")));
    assert_eq!(body["account"].as_str().unwrap().len(), 16);

    assert_eq!(mock.logins(), 1);
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_login_cookie_secure_for_https_frontend() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, _) =
        common::create_test_app_with_frontend_url(&garmin_url, "https://dashboard.example.com");

    let response = common::login(&app, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "garmin_token");
    assert!(cookie.contains("Secure"));
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let (garmin_url, mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, state) = common::create_test_app(&garmin_url);

    let response = common::login(&app, TEST_EMAIL, "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&response).is_empty());

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "fetch_failed");

    assert_eq!(mock.logins(), 0);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_login_rejects_malformed_input() {
    let (garmin_url, mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, _) = common::create_test_app(&garmin_url);

    let response = common::login(&app, "not-an-email", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = common::login(&app, TEST_EMAIL, "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Validation happens before any vendor traffic.
    assert_eq!(mock.logins(), 0);
}

#[tokio::test]
async fn test_login_with_unreachable_vendor_is_bad_gateway() {
    // Port 9 (discard) is not listening.
    let (app, _) = common::create_test_app("http://127.0.0.1:9");

    let response = common::login(&app, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_login_persists_vendor_session_without_password() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, state) = common::create_test_app(&garmin_url);

    common::login_token(&app).await;

    let stored = tokio::fs::read_to_string(&state.config.session_file)
        .await
        .unwrap();
    assert!(stored.contains("token-1"));
    assert!(!stored.contains(TEST_PASSWORD));
    assert!(!stored.contains(TEST_EMAIL));

    let _ = tokio::fs::remove_file(&state.config.session_file).await;
}

#[tokio::test]
async fn test_session_cookie_authenticates_requests() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(common::sample_activities()).await;
    let (app, _) = common::create_test_app(&garmin_url);
    let token = common::login_token(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/activity-types")
                .header(header::COOKIE, format!("garmin_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_rejects_missing_or_bogus_token() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, _) = common::create_test_app(&garmin_url);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "unauthorized");

    let response = common::get_with_token(&app, "/api/dashboard", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_token_for_unknown_session_is_rejected() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, state) = common::create_test_app(&garmin_url);

    // Correctly signed, but names a session this process never created.
    let token = garmin_analytics::middleware::auth::create_jwt(
        "no-such-session",
        &state.config.jwt_signing_key,
    )
    .unwrap();

    let response = common::get_with_token(&app, "/api/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_logout_drops_session_and_clears_cookie() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(common::sample_activities()).await;
    let (app, state) = common::create_test_app(&garmin_url);
    let token = common::login_token(&app).await;
    assert_eq!(state.sessions.len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, format!("garmin_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "garmin_token");
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));

    assert!(state.sessions.is_empty());

    let response = common::get_with_token(&app, "/api/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_clears_cookie() {
    let (garmin_url, _mock) = common::spawn_mock_garmin(vec![]).await;
    let (app, _) = common::create_test_app(&garmin_url);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = find_cookie(&set_cookie_headers(&response), "garmin_token");
    assert!(cookie.contains("Max-Age=0"));
}
