// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! In-memory activity table used by the analysis pipeline.
//!
//! Raw vendor fields stay in a per-row JSON map so that unknown fields are
//! carried through. Fields the pipeline derives (`distanceAdjElevation`,
//! `pace`) are typed. The table tracks which columns exist so that whole
//! columns can be dropped.

use crate::models::activity::columns;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Minutes per kilometer, or the sentinel for a zero effective distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pace {
    MinPerKm(f64),
    /// Effective distance was zero; no finite pace exists.
    Unbounded,
}

impl Pace {
    /// Pace from a duration in seconds and a distance in meters.
    pub fn from_duration_distance(duration_secs: f64, distance_meters: f64) -> Self {
        if distance_meters == 0.0 {
            return Pace::Unbounded;
        }
        let pace = (duration_secs / 60.0) / (distance_meters / 1000.0);
        if pace.is_finite() {
            Pace::MinPerKm(pace)
        } else {
            Pace::Unbounded
        }
    }

    pub fn minutes_per_km(&self) -> Option<f64> {
        match self {
            Pace::MinPerKm(v) => Some(*v),
            Pace::Unbounded => None,
        }
    }
}

impl Serialize for Pace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Pace::MinPerKm(v) => serializer.serialize_f64(*v),
            Pace::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

/// One activity with its parsed start time and derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub datetime: NaiveDateTime,
    pub date: NaiveDate,
    /// `YYYY-WW`, Sunday-start week of year.
    pub year_week: String,
    /// Raw fields; `activityType` has been flattened to its `typeKey`.
    pub fields: Map<String, Value>,
    pub distance_adj_elevation: Option<f64>,
    pub pace: Option<Pace>,
}

impl ActivityRow {
    pub fn activity_type(&self) -> Option<&str> {
        self.fields
            .get(columns::ACTIVITY_TYPE)
            .and_then(Value::as_str)
    }

    /// Numeric value of a raw column, `None` when absent, null or non-numeric.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(Value::as_f64)
    }

    pub fn distance(&self) -> Option<f64> {
        self.number(columns::DISTANCE)
    }

    pub fn duration(&self) -> Option<f64> {
        self.number(columns::DURATION)
    }

    pub fn average_hr(&self) -> Option<f64> {
        self.number(columns::AVERAGE_HR)
    }

    /// Whether `column` has no value in this row.
    pub fn is_missing(&self, column: &str) -> bool {
        match column {
            columns::DISTANCE_ADJ_ELEVATION => self.distance_adj_elevation.is_none(),
            columns::PACE => self.pace.is_none(),
            _ => matches!(self.fields.get(column), None | Some(Value::Null)),
        }
    }
}

impl Serialize for ActivityRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry("yearWeek", &self.year_week)?;
        if let Some(adjusted) = self.distance_adj_elevation {
            map.serialize_entry(columns::DISTANCE_ADJ_ELEVATION, &adjusted)?;
        }
        if let Some(pace) = &self.pace {
            map.serialize_entry(columns::PACE, pace)?;
        }
        map.end()
    }
}

/// Ordered rows plus the set of columns they share.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTable {
    rows: Vec<ActivityRow>,
    /// Raw columns in first-seen order.
    columns: Vec<String>,
    has_distance_adj_elevation: bool,
    has_pace: bool,
}

impl ActivityTable {
    pub fn new(rows: Vec<ActivityRow>, columns: Vec<String>) -> Self {
        Self {
            rows,
            columns,
            has_distance_adj_elevation: false,
            has_pace: false,
        }
    }

    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ActivityRow] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<ActivityRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All column names: raw columns followed by derived ones.
    pub fn columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        if self.has_distance_adj_elevation {
            names.push(columns::DISTANCE_ADJ_ELEVATION);
        }
        if self.has_pace {
            names.push(columns::PACE);
        }
        names
    }

    pub fn has_column(&self, column: &str) -> bool {
        match column {
            columns::DISTANCE_ADJ_ELEVATION => self.has_distance_adj_elevation,
            columns::PACE => self.has_pace,
            _ => self.columns.iter().any(|c| c == column),
        }
    }

    /// Distinct activity types present in the table.
    pub fn activity_types(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|r| r.activity_type().map(str::to_string))
            .collect()
    }

    /// Keep only rows matching `keep`, preserving order.
    pub fn retain_rows<F: FnMut(&ActivityRow) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
    }

    /// Mark a derived column as present after its values were filled in.
    pub fn mark_derived(&mut self, column: &str) {
        match column {
            columns::DISTANCE_ADJ_ELEVATION => self.has_distance_adj_elevation = true,
            columns::PACE => self.has_pace = true,
            _ => {}
        }
    }

    /// Whether any row lacks a value for `column`.
    pub fn column_has_missing(&self, column: &str) -> bool {
        self.rows.iter().any(|r| r.is_missing(column))
    }

    /// Remove a column from the table and from every row. Unknown columns
    /// are ignored.
    pub fn drop_column(&mut self, column: &str) {
        match column {
            columns::DISTANCE_ADJ_ELEVATION => {
                self.has_distance_adj_elevation = false;
                for row in &mut self.rows {
                    row.distance_adj_elevation = None;
                }
            }
            columns::PACE => {
                self.has_pace = false;
                for row in &mut self.rows {
                    row.pace = None;
                }
            }
            _ => {
                self.columns.retain(|c| c != column);
                for row in &mut self.rows {
                    row.fields.shift_remove(column);
                }
            }
        }
    }
}
