// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect login and logout routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, request_token, verify_jwt, SESSION_COOKIE, SESSION_TTL_SECS,
};
use crate::services::Credentials;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Garmin Connect credentials as typed into the login form.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    /// Opaque account fingerprint, never the email itself.
    pub account: String,
}

/// Only mark the cookie Secure when the frontend is served over TLS, so
/// local development over plain http keeps working.
fn session_cookie(frontend_url: &str, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(frontend_url.starts_with("https://"))
        .build()
}

/// Log in to Garmin Connect and open a dashboard session.
///
/// The vendor login happens up front so that wrong credentials are
/// reported here rather than on the first dashboard request.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let credentials = Credentials::new(body.email, body.password);
    let account = credentials.account_fingerprint();

    state.garmin.login(&credentials).await?;

    let session = state.sessions.create(credentials)?;
    let token = create_jwt(session.id(), &state.config.jwt_signing_key)?;

    tracing::info!(%account, sessions = state.sessions.len(), "Dashboard session created");

    let cookie = {
        let mut cookie = session_cookie(&state.config.frontend_url, token.clone());
        cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));
        cookie
    };

    Ok((jar.add(cookie), Json(LoginResponse { token, account })))
}

/// Drop the dashboard session (and its fetch cache) and clear the cookie.
///
/// Succeeds even without a valid token so a stale browser can always
/// clear its cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (StatusCode, CookieJar) {
    let session_id = request_token(&jar, &headers)
        .and_then(|token| verify_jwt(&token, &state.config.jwt_signing_key));

    if let Some(id) = session_id {
        if state.sessions.remove(&id) {
            tracing::info!("Dashboard session closed");
        }
    }

    // Always emit the removal, even for bearer-authenticated requests.
    let mut removal = session_cookie(&state.config.frontend_url, String::new());
    removal.make_removal();
    (StatusCode::NO_CONTENT, jar.add(removal))
}
