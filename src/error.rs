// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure talking to the Garmin Connect API.
///
/// Every variant carries a human-readable cause. None of them are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Bad credentials or an expired/invalid vendor session.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network failure, timeout, or an unexpected vendor response.
    #[error("connection to Garmin Connect failed: {0}")]
    Connectivity(String),

    /// The vendor answered 429.
    #[error("rate limited by Garmin Connect: {0}")]
    RateLimit(String),
}

impl FetchError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, FetchError::Authentication(_))
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    #[error("Unexpected activity data: {0}")]
    DataShape(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::FetchFailed(err) => {
                tracing::warn!(error = %err, "Activity fetch failed");
                let status = match err {
                    FetchError::Authentication(_) => StatusCode::UNAUTHORIZED,
                    FetchError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
                    FetchError::Connectivity(_) => StatusCode::BAD_GATEWAY,
                };
                (status, "fetch_failed", Some(err.to_string()))
            }
            AppError::DataShape(msg) => {
                tracing::warn!(error = %msg, "Activity data rejected");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "data_shape_error",
                    Some(msg.clone()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
