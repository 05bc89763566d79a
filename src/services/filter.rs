// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heart-rate and pace range filtering, null handling and column cleanup.

use crate::models::activity::columns;
use crate::models::{ActivityTable, Pace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Columns a row must have under [`NullPolicy::PerRow`].
const CORE_METRICS: &[&str] = &[
    columns::DISTANCE,
    columns::DURATION,
    columns::AVERAGE_HR,
    columns::PACE,
];

/// How missing values are handled after range filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    /// Drop every column that is missing in at least one remaining row.
    /// A single incomplete activity removes that column for all of them.
    #[default]
    StrictColumn,
    /// Keep every column; drop rows missing any core metric instead.
    PerRow,
}

impl fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NullPolicy::StrictColumn => "strict-column",
            NullPolicy::PerRow => "per-row",
        })
    }
}

impl FromStr for NullPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict-column" => Ok(NullPolicy::StrictColumn),
            "per-row" => Ok(NullPolicy::PerRow),
            other => Err(format!("unknown null policy: {other}")),
        }
    }
}

/// Open interval `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenRange {
    pub min: f64,
    pub max: f64,
}

impl OpenRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Default heart-rate window (bpm).
pub const DEFAULT_HR_RANGE: OpenRange = OpenRange::new(118.0, 155.0);
/// Default pace window (min/km).
pub const DEFAULT_PACE_RANGE: OpenRange = OpenRange::new(4.8, 12.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub hr_range: OpenRange,
    pub pace_range: OpenRange,
    pub apply_pace_filter: bool,
    pub null_policy: NullPolicy,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            hr_range: DEFAULT_HR_RANGE,
            pace_range: DEFAULT_PACE_RANGE,
            apply_pace_filter: true,
            null_policy: NullPolicy::StrictColumn,
        }
    }
}

/// Apply range filters, the null policy, then strip identity columns.
///
/// Rows without an average HR never pass. With the pace filter on,
/// missing or [`Pace::Unbounded`] pace never passes. Row order is kept.
pub fn apply(mut table: ActivityTable, params: &FilterParams) -> ActivityTable {
    let before = table.len();

    table.retain_rows(|r| r.average_hr().is_some_and(|hr| params.hr_range.contains(hr)));

    if params.apply_pace_filter {
        table.retain_rows(|r| match r.pace {
            Some(Pace::MinPerKm(pace)) => params.pace_range.contains(pace),
            Some(Pace::Unbounded) | None => false,
        });
    }

    match params.null_policy {
        NullPolicy::StrictColumn => {
            let incomplete: Vec<String> = table
                .columns()
                .into_iter()
                .filter(|c| table.column_has_missing(c))
                .map(str::to_string)
                .collect();
            if !incomplete.is_empty() {
                tracing::debug!(columns = ?incomplete, "Dropping columns with missing values");
            }
            for column in &incomplete {
                table.drop_column(column);
            }
        }
        NullPolicy::PerRow => {
            table.retain_rows(|r| CORE_METRICS.iter().all(|c| !r.is_missing(c)));
        }
    }

    for column in columns::IDENTITY {
        table.drop_column(column);
    }

    tracing::debug!(
        before,
        after = table.len(),
        null_policy = %params.null_policy,
        "Filtered activities"
    );

    table
}
