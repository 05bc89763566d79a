// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::services::session::SESSION_TTL;
use crate::services::DashboardSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the dashboard session JWT.
pub const SESSION_COOKIE: &str = "garmin_token";

/// Lifetime of a dashboard session token.
pub const SESSION_TTL_SECS: usize = SESSION_TTL.as_secs() as usize;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (dashboard session id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Dashboard session resolved from the request's JWT.
#[derive(Clone)]
pub struct AuthSession(pub Arc<DashboardSession>);

/// Middleware that requires a valid JWT naming a live dashboard session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(&jar, request.headers()).ok_or(AppError::Unauthorized)?;

    let session_id =
        verify_jwt(&token, &state.config.jwt_signing_key).ok_or(AppError::InvalidToken)?;

    // Sessions live in memory; a restart, logout or expiry invalidates the token.
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(AppError::InvalidToken)?;

    request.extensions_mut().insert(AuthSession(session));

    Ok(next.run(request).await)
}

/// Session token from the cookie, falling back to a bearer header.
pub fn request_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decode a session JWT and return its subject.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Create a JWT for a dashboard session.
pub fn create_jwt(session_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: session_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
