// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use garmin_analytics::config::Config;
use garmin_analytics::routes::create_router;
use garmin_analytics::services::{GarminClient, GarminService, SessionFile, SessionStore};
use garmin_analytics::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[allow(dead_code)]
pub const TEST_EMAIL: &str = "runner@example.com";
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct-horse";

/// In-process stand-in for Garmin Connect.
#[derive(Default)]
pub struct MockGarmin {
    activities: Mutex<Vec<Value>>,
    valid_token: Mutex<Option<String>>,
    logins: AtomicUsize,
    searches: AtomicUsize,
    rate_limited: AtomicBool,
}

#[allow(dead_code)]
impl MockGarmin {
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Number of search page requests served successfully.
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn set_rate_limited(&self, limited: bool) {
        self.rate_limited.store(limited, Ordering::SeqCst);
    }

    /// Invalidate the issued token, as when Garmin expires a session.
    pub fn expire_session(&self) {
        *self.valid_token.lock().unwrap() = None;
    }

    pub fn set_activities(&self, activities: Vec<Value>) {
        *self.activities.lock().unwrap() = activities;
    }
}

async fn mock_login(State(mock): State<Arc<MockGarmin>>, Json(body): Json<Value>) -> Response {
    if body["username"] != TEST_EMAIL || body["password"] != TEST_PASSWORD {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    let n = mock.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{n}");
    *mock.valid_token.lock().unwrap() = Some(token.clone());

    Json(json!({"access_token": token, "expires_in": 3600})).into_response()
}

async fn mock_search(
    State(mock): State<Arc<MockGarmin>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if mock.rate_limited.load(Ordering::SeqCst) {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);
    if bearer.is_none() || bearer != *mock.valid_token.lock().unwrap() {
        return (StatusCode::UNAUTHORIZED, "session expired").into_response();
    }

    mock.searches.fetch_add(1, Ordering::SeqCst);

    let start: usize = params.get("start").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let page: Vec<Value> = mock
        .activities
        .lock()
        .unwrap()
        .iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();

    Json(page).into_response()
}

/// Start a mock Garmin Connect server on an ephemeral port.
/// Returns its base URL and a handle for inspecting and steering it.
pub async fn spawn_mock_garmin(activities: Vec<Value>) -> (String, Arc<MockGarmin>) {
    let mock = Arc::new(MockGarmin::default());
    mock.set_activities(activities);

    let app = Router::new()
        .route("/login", post(mock_login))
        .route(
            "/activitylist-service/activities/search/activities",
            get(mock_search),
        )
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), mock)
}

/// Unique session file per test so parallel tests don't share sessions.
fn temp_session_file() -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "garmin-analytics-it-{}-{}.json",
        std::process::id(),
        n
    ))
}

/// Create a test app talking to the Garmin server at `garmin_url`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(garmin_url: &str) -> (Router, Arc<AppState>) {
    create_test_app_with_config(garmin_url, Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(
    garmin_url: &str,
    frontend_url: &str,
) -> (Router, Arc<AppState>) {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::test_default()
    };
    create_test_app_with_config(garmin_url, config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(garmin_url: &str, config: Config) -> (Router, Arc<AppState>) {
    let config = Config {
        garmin_api_url: garmin_url.to_string(),
        garmin_auth_url: format!("{garmin_url}/login"),
        session_file: temp_session_file(),
        ..config
    };

    let client = GarminClient::new(
        &config.garmin_api_url,
        &config.garmin_auth_url,
        config.http_timeout,
    )
    .unwrap();
    let garmin = GarminService::new(client, SessionFile::new(config.session_file.clone()));
    let sessions = SessionStore::new(config.fetch_cache_ttl);

    let state = Arc::new(AppState {
        config,
        garmin,
        sessions,
    });

    (create_router(state.clone()), state)
}

/// POST /auth/login with the given credentials.
#[allow(dead_code)]
pub async fn login(app: &Router, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": email, "password": password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Log in with the mock's credentials and return the session token.
#[allow(dead_code)]
pub async fn login_token(app: &Router) -> String {
    let response = login(app, TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Authenticated GET.
#[allow(dead_code)]
pub async fn get_with_token(app: &Router, uri: &str, token: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Three runs and a ride in early 2023.
#[allow(dead_code)]
pub fn sample_activities() -> Vec<Value> {
    vec![
        json!({
            "activityId": 1, "activityName": "Morning Run",
            "startTimeLocal": "2023-02-01 07:00:00",
            "activityType": {"typeId": 1, "typeKey": "running"},
            "eventType": {"typeKey": "uncategorized"},
            "ownerId": 42, "ownerDisplayName": "runner",
            "distance": 5000.0, "duration": 1800.0, "averageHR": 130.0,
            "elevationGain": 100.0, "elevationLoss": 50.0,
        }),
        json!({
            "activityId": 2, "activityName": "Easy Run",
            "startTimeLocal": "2023-02-03 07:00:00",
            "activityType": {"typeId": 1, "typeKey": "running"},
            "eventType": {"typeKey": "uncategorized"},
            "ownerId": 42, "ownerDisplayName": "runner",
            "distance": 3000.0, "duration": 1200.0, "averageHR": 140.0,
            "elevationGain": 0.0, "elevationLoss": 0.0,
        }),
        json!({
            "activityId": 3, "activityName": "Ride",
            "startTimeLocal": "2023-02-04 09:00:00",
            "activityType": {"typeId": 2, "typeKey": "cycling"},
            "eventType": {"typeKey": "uncategorized"},
            "ownerId": 42, "ownerDisplayName": "runner",
            "distance": 40000.0, "duration": 5400.0, "averageHR": 125.0,
            "elevationGain": 300.0, "elevationLoss": 300.0,
        }),
        json!({
            "activityId": 4, "activityName": "Long Run",
            "startTimeLocal": "2023-02-12 07:00:00",
            "activityType": {"typeId": 1, "typeKey": "running"},
            "eventType": {"typeKey": "uncategorized"},
            "ownerId": 42, "ownerDisplayName": "runner",
            "distance": 8000.0, "duration": 2880.0, "averageHR": 135.0,
            "elevationGain": 20.0, "elevationLoss": 20.0,
        }),
    ]
}
