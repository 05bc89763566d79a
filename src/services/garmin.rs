// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect client for logging in and fetching activities.
//!
//! Handles:
//! - Credential login returning an opaque session blob
//! - Reusing the persisted session blob across restarts
//! - Falling back to a fresh login when the stored session is rejected
//! - Paginated activity search
//! - Mapping HTTP failures to authentication / rate limit / connectivity

use crate::error::FetchError;
use crate::models::ActivityRecord;
use crate::services::session::DashboardSession;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const SEARCH_PATH: &str = "/activitylist-service/activities/search/activities";
/// Page size used by the Garmin web client.
const PAGE_SIZE: usize = 20;
/// Stop paginating after this many pages even if the API keeps answering.
const MAX_PAGES: usize = 500;

/// Garmin account credentials. Never persisted and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Stable, non-reversible account identifier for logs and the session
    /// file.
    pub fn account_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.email.trim().to_lowercase().as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account_fingerprint())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One activity search: inclusive date range plus optional type filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Garmin `typeKey`; `None` fetches every type.
    pub activity_type: Option<String>,
}

/// Opaque Garmin session as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSession {
    /// Fingerprint of the account this session belongs to.
    pub account: String,
    /// Raw login response, persisted verbatim.
    pub data: serde_json::Value,
}

impl VendorSession {
    fn access_token(&self) -> Option<&str> {
        self.data.get("access_token").and_then(|v| v.as_str())
    }
}

/// Low-level Garmin Connect HTTP client.
#[derive(Clone)]
pub struct GarminClient {
    http: reqwest::Client,
    api_url: String,
    auth_url: String,
}

impl GarminClient {
    pub fn new(api_url: &str, auth_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building Garmin HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            auth_url: auth_url.to_string(),
        })
    }

    /// Log in with credentials and return the new session.
    pub async fn login(&self, credentials: &Credentials) -> Result<VendorSession, FetchError> {
        let body = serde_json::json!({
            "username": credentials.email,
            "password": credentials.password,
        });

        let response = self
            .http
            .post(&self.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Connectivity(format!("login request failed: {e}")))?;

        let data: serde_json::Value = check_response_json(response).await?;
        let session = VendorSession {
            account: credentials.account_fingerprint(),
            data,
        };

        if session.access_token().is_none() {
            return Err(FetchError::Authentication(
                "login response did not contain an access token".to_string(),
            ));
        }

        Ok(session)
    }

    /// Fetch every activity matching `query`, following pagination.
    pub async fn search_activities(
        &self,
        session: &VendorSession,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        let token = session.access_token().ok_or_else(|| {
            FetchError::Authentication("stored session has no access token".to_string())
        })?;

        let mut activities = Vec::new();
        for page in 0..MAX_PAGES {
            let batch = self.search_page(token, query, page * PAGE_SIZE).await?;
            let done = batch.len() < PAGE_SIZE;
            activities.extend(batch);
            if done {
                return Ok(activities);
            }
        }

        tracing::warn!(
            pages = MAX_PAGES,
            fetched = activities.len(),
            "Activity search hit the page limit, returning partial range"
        );
        Ok(activities)
    }

    async fn search_page(
        &self,
        token: &str,
        query: &ActivityQuery,
        start: usize,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        let url = format!("{}{}", self.api_url, SEARCH_PATH);

        let mut params = vec![
            ("startDate", query.start.to_string()),
            ("endDate", query.end.to_string()),
            ("start", start.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        if let Some(activity_type) = &query.activity_type {
            params.push(("activityType", activity_type.clone()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Connectivity(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        return Err(match status.as_u16() {
            401 | 403 => FetchError::Authentication(format!("HTTP {status}")),
            429 => {
                tracing::warn!("Garmin rate limit hit (429)");
                FetchError::RateLimit("too many requests, try again later".to_string())
            }
            _ => FetchError::Connectivity(format!("HTTP {status}: {body}")),
        });
    }

    response
        .json()
        .await
        .map_err(|e| FetchError::Connectivity(format!("JSON parse error: {e}")))
}

/// The single session file shared by the whole deployment.
///
/// Logging in with a second account replaces the first account's session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. Missing or unreadable files count as absent.
    pub async fn load(&self) -> Option<VendorSession> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Ignoring corrupt session file");
                None
            }
        }
    }

    pub async fn save(&self, session: &VendorSession) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

/// High-level Garmin service: session reuse, re-login and caching.
#[derive(Clone)]
pub struct GarminService {
    client: GarminClient,
    session_file: SessionFile,
    /// Serializes logins so concurrent requests don't race on the file.
    login_lock: Arc<Mutex<()>>,
}

impl GarminService {
    pub fn new(client: GarminClient, session_file: SessionFile) -> Self {
        Self {
            client,
            session_file,
            login_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Log in with credentials and persist the new session blob.
    pub async fn login(&self, credentials: &Credentials) -> Result<VendorSession, FetchError> {
        let _guard = self.login_lock.lock().await;

        let account = credentials.account_fingerprint();
        tracing::info!(%account, "Logging in to Garmin Connect with credentials");

        let session = self.client.login(credentials).await?;

        if let Err(e) = self.session_file.save(&session).await {
            tracing::warn!(error = %e, "Failed to persist Garmin session, continuing anyway");
        } else {
            tracing::info!(
                path = %self.session_file.path().display(),
                "Garmin session stored for reuse"
            );
        }

        Ok(session)
    }

    /// Stored session for this account, or a fresh login.
    async fn session_for(&self, credentials: &Credentials) -> Result<VendorSession, FetchError> {
        let account = credentials.account_fingerprint();
        match self.session_file.load().await {
            Some(session) if session.account == account => {
                tracing::debug!(%account, "Using stored Garmin session");
                Ok(session)
            }
            Some(session) => {
                tracing::warn!(
                    stored = %session.account,
                    %account,
                    "Session file belongs to another account, replacing it"
                );
                self.login(credentials).await
            }
            None => self.login(credentials).await,
        }
    }

    /// Fetch activities, retrying once with a fresh login if the stored
    /// session has been rejected.
    pub async fn fetch_activities(
        &self,
        credentials: &Credentials,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        let session = self.session_for(credentials).await?;

        match self.client.search_activities(&session, query).await {
            Err(e) if e.is_authentication() => {
                tracing::info!(error = %e, "Stored Garmin session rejected, logging in again");
                let session = self.login(credentials).await?;
                self.client.search_activities(&session, query).await
            }
            result => result,
        }
    }

    /// Fetch through the dashboard session's cache.
    ///
    /// A hit skips the network entirely; callers still recompute every
    /// derived view from the returned records.
    pub async fn fetch_cached(
        &self,
        session: &DashboardSession,
        query: &ActivityQuery,
    ) -> Result<Arc<Vec<ActivityRecord>>, FetchError> {
        if let Some(records) = session.cache().get(query) {
            tracing::debug!(
                start = %query.start,
                end = %query.end,
                count = records.len(),
                "Fetch cache hit"
            );
            return Ok(records);
        }

        let records = Arc::new(
            self.fetch_activities(session.credentials(), query)
                .await?,
        );

        tracing::info!(
            start = %query.start,
            end = %query.end,
            count = records.len(),
            "Fetched activities from Garmin Connect"
        );

        session.cache().insert(query.clone(), records.clone());
        Ok(records)
    }
}
