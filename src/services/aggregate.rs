// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly distance aggregation.

use crate::models::activity::columns;
use crate::models::{ActivityTable, WeekVolume, WeeklyVolume};
use std::collections::BTreeMap;

/// Sum raw distance per `YYYY-WW` bucket, in kilometers.
///
/// Rows without a distance contribute nothing to their bucket (the bucket
/// still appears). A table whose `distance` column was dropped has no
/// weekly volume at all. Buckets are ordered by key, which sorts
/// chronologically because both parts are zero-padded.
pub fn weekly_volume(table: &ActivityTable) -> WeeklyVolume {
    if !table.is_empty() && !table.has_column(columns::DISTANCE) {
        tracing::warn!(
            rows = table.len(),
            "No distance column left after filtering, weekly volume unavailable"
        );
        return WeeklyVolume::default();
    }

    let mut meters_by_week: BTreeMap<&str, f64> = BTreeMap::new();
    for row in table.rows() {
        *meters_by_week.entry(row.year_week.as_str()).or_insert(0.0) +=
            row.distance().unwrap_or(0.0);
    }

    WeeklyVolume {
        weeks: meters_by_week
            .into_iter()
            .map(|(year_week, meters)| WeekVolume {
                year_week: year_week.to_string(),
                kilometers: meters / 1000.0,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::table::build;
    use serde_json::json;

    fn activity(start: &str, distance: f64) -> serde_json::Value {
        json!({"startTimeLocal": start, "distance": distance})
    }

    #[test]
    fn test_same_week_sums_to_kilometers() {
        // 2023-02-01 (Wed) and 2023-02-03 (Fri) are both in week 05.
        let table = build(vec![
            activity("2023-02-01 07:00:00", 5000.0),
            activity("2023-02-03 18:30:00", 3000.0),
        ])
        .unwrap();

        let volume = weekly_volume(&table);
        assert_eq!(volume.len(), 1);
        assert_eq!(volume.get("2023-05"), Some(8.0));
    }

    #[test]
    fn test_single_digit_weeks_sort_before_double_digit() {
        let mut records = Vec::new();
        // One activity per Monday from 2023-01-02 (week 01) to 2023-03-06 (week 10).
        let mut day = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        for _ in 0..10 {
            records.push(activity(&format!("{day} 07:00:00"), 1000.0));
            day += chrono::Duration::days(7);
        }
        // Insert out of order to make sure ordering comes from the keys.
        records.reverse();

        let volume = weekly_volume(&build(records).unwrap());
        let keys: Vec<&str> = volume.weeks.iter().map(|w| w.year_week.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "2023-01", "2023-02", "2023-03", "2023-04", "2023-05", "2023-06", "2023-07",
                "2023-08", "2023-09", "2023-10"
            ]
        );
    }

    #[test]
    fn test_missing_distance_contributes_zero() {
        let table = build(vec![
            json!({"startTimeLocal": "2023-02-01 07:00:00"}),
            activity("2023-02-02 07:00:00", 2500.0),
        ])
        .unwrap();

        let volume = weekly_volume(&table);
        assert_eq!(volume.get("2023-05"), Some(2.5));
    }

    #[test]
    fn test_dropped_distance_column_yields_no_weeks() {
        let mut table = build(vec![
            json!({"startTimeLocal": "2023-02-01 07:00:00", "distance": 20000.0}),
            json!({"startTimeLocal": "2023-02-02 07:00:00"}),
        ])
        .unwrap();
        table.drop_column(columns::DISTANCE);

        assert!(weekly_volume(&table).is_empty());
    }

    #[test]
    fn test_empty_table_has_no_weeks() {
        assert!(weekly_volume(&ActivityTable::default()).is_empty());
    }
}
