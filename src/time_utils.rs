// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and week bucketing.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Formats Garmin uses for `startTimeLocal`.
const START_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a local start time such as `2023-05-01 07:12:45`.
pub fn parse_start_time_local(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// `YYYY-WW` bucket where weeks start on Sunday and days before the first
/// Sunday of the year fall in week `00` (strftime `%U`, not ISO-8601).
pub fn year_week(date: NaiveDate) -> String {
    date.format("%Y-%U").to_string()
}

/// Seconds since the epoch, treating the local time as if it were UTC.
pub fn naive_unix_seconds(datetime: NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp()
}

/// Day after `today`, the default end of a fetch window.
pub fn default_end_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}
