// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalize raw Garmin activity documents into an [`ActivityTable`].

use crate::error::{AppError, Result};
use crate::models::activity::columns;
use crate::models::{ActivityRecord, ActivityRow, ActivityTable};
use crate::time_utils::{parse_start_time_local, year_week};
use serde_json::Value;

/// Build a table from fetched records.
///
/// Fails the whole batch if any record is not an object or lacks a
/// parsable `startTimeLocal`; a partially built table would skew weekly
/// totals without anyone noticing. Rows come out sorted by start time.
pub fn build(records: Vec<ActivityRecord>) -> Result<ActivityTable> {
    let mut columns_seen: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(mut fields) = record else {
            return Err(AppError::DataShape(format!(
                "activity #{index} is not a JSON object"
            )));
        };

        let datetime = fields
            .get(columns::START_TIME_LOCAL)
            .and_then(Value::as_str)
            .and_then(parse_start_time_local)
            .ok_or_else(|| {
                AppError::DataShape(format!(
                    "activity #{index} has a missing or malformed {}",
                    columns::START_TIME_LOCAL
                ))
            })?;

        // Flatten {"typeKey": "running", ...} to "running"; null when absent.
        if let Some(activity_type) = fields
            .get_mut(columns::ACTIVITY_TYPE)
            .filter(|v| !v.is_string())
        {
            let type_key = activity_type
                .get(columns::TYPE_KEY)
                .and_then(Value::as_str)
                .map(|key| Value::String(key.to_string()))
                .unwrap_or(Value::Null);
            *activity_type = type_key;
        }

        for key in fields.keys() {
            if !columns_seen.iter().any(|c| c == key) {
                columns_seen.push(key.clone());
            }
        }

        let date = datetime.date();
        rows.push(ActivityRow {
            datetime,
            date,
            year_week: year_week(date),
            fields,
            distance_adj_elevation: None,
            pace: None,
        });
    }

    // Garmin lists newest first.
    rows.sort_by_key(|r| r.datetime);

    tracing::debug!(
        rows = rows.len(),
        columns = columns_seen.len(),
        "Built activity table"
    );

    Ok(ActivityTable::new(rows, columns_seen))
}
