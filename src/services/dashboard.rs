// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Everything the dashboard plots, computed from one activity table.
//!
//! [`render`] is pure: the same table and parameters always produce the
//! same view. Callers re-run it whenever any parameter changes, even when
//! the table itself came from the fetch cache.

use crate::models::{ActivityKind, ActivityRow, ActivityTable, WeeklyVolume};
use crate::services::aggregate::weekly_volume;
use crate::services::filter::{self, FilterParams, NullPolicy, OpenRange};
use crate::services::metrics::{derive, ElevationFactors};
use crate::services::trend::{fit, TrendLine};
use crate::time_utils::naive_unix_seconds;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User-selected analysis parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub activity: ActivityKind,
    pub elevation_correction: bool,
    pub filter: FilterParams,
}

impl DashboardParams {
    /// Defaults for `activity`: the pace window only applies to running.
    pub fn for_activity(activity: ActivityKind) -> Self {
        let filter = FilterParams {
            apply_pace_filter: activity.filters_pace_by_default(),
            ..FilterParams::default()
        };
        Self {
            activity,
            elevation_correction: false,
            filter,
        }
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.filter.null_policy = policy;
        self
    }

    /// Whether the distance series uses elevation-adjusted distance.
    pub fn uses_adjusted_distance(&self) -> bool {
        self.elevation_correction && !self.activity.is_indoor_cycling()
    }
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self::for_activity(ActivityKind::default())
    }
}

/// One dated value on a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChartPoint {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub unix: i64,
    pub value: f64,
}

/// A time series plus its linear trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChartSeries {
    pub label: String,
    pub unit: String,
    pub points: Vec<ChartPoint>,
    pub trend: Option<TrendLine>,
}

impl ChartSeries {
    fn collect<F>(label: &str, unit: &str, rows: &[ActivityRow], value: F) -> Self
    where
        F: Fn(&ActivityRow) -> Option<f64>,
    {
        let points: Vec<ChartPoint> = rows
            .iter()
            .filter_map(|row| {
                value(row).map(|v| ChartPoint {
                    date: row.date.to_string(),
                    unix: naive_unix_seconds(row.datetime),
                    value: v,
                })
            })
            .collect();

        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.unix as f64, p.value)).collect();

        Self {
            label: label.to_string(),
            unit: unit.to_string(),
            trend: fit(&xy),
            points,
        }
    }
}

/// HR scatter point sized by distance and colored by pace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScatterPoint {
    pub date: String,
    pub average_hr: f64,
    pub distance_meters: f64,
    pub pace: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardView {
    pub activity: String,
    /// Every activity type in the fetched range, for the type picker.
    pub activity_types: Vec<String>,
    pub elevation_correction: bool,
    pub hr_range: [f64; 2],
    pub pace_range: Option<[f64; 2]>,
    pub null_policy: String,
    pub columns: Vec<String>,
    #[cfg_attr(
        feature = "binding-generation",
        ts(type = "Array<Record<string, unknown>>")
    )]
    pub rows: Vec<ActivityRow>,
    pub heart_rate: ChartSeries,
    pub pace: ChartSeries,
    pub distance: ChartSeries,
    pub scatter: Vec<ScatterPoint>,
    pub weekly_volume: WeeklyVolume,
}

fn range_pair(range: &OpenRange) -> [f64; 2] {
    [range.min, range.max]
}

/// Run the full pipeline: derive, filter, then build chart data.
pub fn render(
    table: &ActivityTable,
    params: &DashboardParams,
    factors: ElevationFactors,
) -> DashboardView {
    let activity_types = table.activity_types().into_iter().collect();

    let derived = derive(
        table.clone(),
        &params.activity,
        params.elevation_correction,
        factors,
    );
    let filtered = filter::apply(derived, &params.filter);

    let adjusted = params.uses_adjusted_distance();
    let distance_used = |row: &ActivityRow| {
        if adjusted {
            row.distance_adj_elevation
        } else {
            row.distance()
        }
    };

    let rows = filtered.rows();
    let heart_rate = ChartSeries::collect("Average HR", "bpm", rows, ActivityRow::average_hr);
    let pace = ChartSeries::collect("Average Pace", "min/km", rows, |r| {
        r.pace.and_then(|p| p.minutes_per_km())
    });
    let distance = ChartSeries::collect("Distance", "km", rows, |r| {
        distance_used(r).map(|m| m / 1000.0)
    });

    // Scatter marker size only follows the correction for running.
    let scatter_adjusted = adjusted && params.activity == ActivityKind::Running;
    let scatter = rows
        .iter()
        .filter_map(|r| {
            let distance_meters = if scatter_adjusted {
                r.distance_adj_elevation?
            } else {
                r.distance()?
            };
            Some(ScatterPoint {
                date: r.date.to_string(),
                average_hr: r.average_hr()?,
                distance_meters,
                pace: r.pace?.minutes_per_km()?,
            })
        })
        .collect();

    let view = DashboardView {
        activity: params.activity.to_string(),
        activity_types,
        elevation_correction: adjusted,
        hr_range: range_pair(&params.filter.hr_range),
        pace_range: params
            .filter
            .apply_pace_filter
            .then(|| range_pair(&params.filter.pace_range)),
        null_policy: params.filter.null_policy.to_string(),
        columns: filtered.columns().into_iter().map(str::to_string).collect(),
        weekly_volume: weekly_volume(&filtered),
        heart_rate,
        pace,
        distance,
        scatter,
        rows: filtered.into_rows(),
    };

    tracing::debug!(
        activity = %view.activity,
        rows = view.rows.len(),
        weeks = view.weekly_volume.len(),
        "Rendered dashboard"
    );

    view
}
