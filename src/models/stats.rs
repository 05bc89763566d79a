// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly training volume.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Total distance in one `YYYY-WW` bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeekVolume {
    pub year_week: String,
    pub kilometers: f64,
}

/// Week buckets in ascending `year_week` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklyVolume {
    pub weeks: Vec<WeekVolume>,
}

impl WeeklyVolume {
    /// Kilometers for a bucket, if the bucket exists.
    pub fn get(&self, year_week: &str) -> Option<f64> {
        self.weeks
            .iter()
            .find(|w| w.year_week == year_week)
            .map(|w| w.kilometers)
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn total_kilometers(&self) -> f64 {
        self.weeks.iter().map(|w| w.kilometers).sum()
    }
}
