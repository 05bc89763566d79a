// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthSession;
use crate::models::{ActivityKind, WeeklyVolume};
use crate::services::filter::{DEFAULT_HR_RANGE, DEFAULT_PACE_RANGE};
use crate::services::{
    render, ActivityLoader, ActivityQuery, DashboardParams, DashboardView, NullPolicy, OpenRange,
};
use crate::time_utils::default_end_date;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activity-types", get(get_activity_types))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/weekly-volume", get(get_weekly_volume))
}

/// First day of the default fetch window.
pub const DEFAULT_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2023, 2, 1) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};

const MAX_HEART_RATE: f64 = 220.0;
const MAX_PACE: f64 = 13.0;

// ─── Date Window ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Fetch query for a date window. Every activity type is fetched so that
/// switching the selected type is served from the session cache.
fn activity_query(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ActivityQuery> {
    let start = start.unwrap_or(DEFAULT_START_DATE);
    let end = end.unwrap_or_else(|| default_end_date(today));

    if start > end {
        return Err(AppError::BadRequest(format!(
            "start date {start} is after end date {end}"
        )));
    }

    Ok(ActivityQuery {
        start,
        end,
        activity_type: None,
    })
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ─── Activity Types ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityTypesResponse {
    pub activity_types: Vec<String>,
}

/// Distinct activity types observed in the window, for the type selector.
async fn get_activity_types(
    State(state): State<Arc<AppState>>,
    Extension(AuthSession(session)): Extension<AuthSession>,
    Query(params): Query<DateRangeQuery>,
) -> Result<Json<ActivityTypesResponse>> {
    let query = activity_query(params.start, params.end, today())?;
    let table = ActivityLoader::new(&state.garmin)
        .load(&session, &query)
        .await?;

    Ok(Json(ActivityTypesResponse {
        activity_types: table.activity_types().into_iter().collect(),
    }))
}

// ─── Dashboard ───────────────────────────────────────────────

/// Query string shared by the dashboard and weekly volume endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub activity: Option<ActivityKind>,
    pub elevation_correction: Option<bool>,
    pub hr_min: Option<f64>,
    pub hr_max: Option<f64>,
    pub pace_min: Option<f64>,
    pub pace_max: Option<f64>,
    /// Defaults to on for running only.
    pub pace_filter: Option<bool>,
    pub null_policy: Option<NullPolicy>,
}

fn bounded_range(
    name: &str,
    min: Option<f64>,
    max: Option<f64>,
    default: OpenRange,
    limit: f64,
) -> Result<OpenRange> {
    let range = OpenRange::new(min.unwrap_or(default.min), max.unwrap_or(default.max));

    let in_bounds = |v: f64| (0.0..=limit).contains(&v);
    if !in_bounds(range.min) || !in_bounds(range.max) {
        return Err(AppError::BadRequest(format!(
            "{name} range must lie within [0, {limit}]"
        )));
    }
    if range.min >= range.max {
        return Err(AppError::BadRequest(format!(
            "{name} minimum {} must be below maximum {}",
            range.min, range.max
        )));
    }

    Ok(range)
}

impl DashboardQuery {
    /// Apply defaults and validate.
    pub fn resolve(
        &self,
        today: NaiveDate,
        default_null_policy: NullPolicy,
    ) -> Result<(ActivityQuery, DashboardParams)> {
        let query = activity_query(self.start, self.end, today)?;

        let mut params = DashboardParams::for_activity(self.activity.clone().unwrap_or_default())
            .with_null_policy(self.null_policy.unwrap_or(default_null_policy));

        params.elevation_correction = self.elevation_correction.unwrap_or(false);
        params.filter.hr_range = bounded_range(
            "heart rate",
            self.hr_min,
            self.hr_max,
            DEFAULT_HR_RANGE,
            MAX_HEART_RATE,
        )?;
        params.filter.pace_range = bounded_range(
            "pace",
            self.pace_min,
            self.pace_max,
            DEFAULT_PACE_RANGE,
            MAX_PACE,
        )?;
        if let Some(pace_filter) = self.pace_filter {
            params.filter.apply_pace_filter = pace_filter;
        }

        Ok((query, params))
    }
}

async fn load_view(
    state: &AppState,
    session: &AuthSession,
    params: &DashboardQuery,
) -> Result<DashboardView> {
    let (query, params) = params.resolve(today(), state.config.null_policy)?;
    let table = ActivityLoader::new(&state.garmin)
        .load(&session.0, &query)
        .await?;

    Ok(render(&table, &params, state.config.elevation_factors))
}

/// Charts, scatter data and table rows for the selected parameters.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardView>> {
    Ok(Json(load_view(&state, &session, &params).await?))
}

/// Weekly distance totals for the selected parameters.
async fn get_weekly_volume(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<WeeklyVolume>> {
    let view = load_view(&state, &session, &params).await?;
    Ok(Json(view.weekly_volume))
}
