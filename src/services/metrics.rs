// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived metrics: elevation-adjusted distance and pace.

use crate::models::activity::columns;
use crate::models::{ActivityKind, ActivityTable, Pace};
use serde::{Deserialize, Serialize};

/// Meters of distance credited per meter climbed and descended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationFactors {
    pub up: f64,
    pub down: f64,
}

impl Default for ElevationFactors {
    fn default() -> Self {
        Self { up: 4.0, down: -2.0 }
    }
}

impl ElevationFactors {
    /// `distance + gain*up + loss*down`. Missing gain or loss counts as 0.
    pub fn adjust(&self, distance: f64, gain: Option<f64>, loss: Option<f64>) -> f64 {
        distance + gain.unwrap_or(0.0) * self.up + loss.unwrap_or(0.0) * self.down
    }
}

/// Restrict `table` to one activity kind and add derived columns.
///
/// - Outdoor kinds get `distanceAdjElevation`; pace uses it when
///   `elevation_correction` is on, raw distance otherwise.
/// - Indoor cycling drops rows with zero distance and always uses raw
///   distance for pace.
/// - Zero effective distance yields [`Pace::Unbounded`]; a missing
///   duration or distance leaves pace missing.
pub fn derive(
    mut table: ActivityTable,
    selection: &ActivityKind,
    elevation_correction: bool,
    factors: ElevationFactors,
) -> ActivityTable {
    let type_key = selection.type_key();
    table.retain_rows(|r| r.activity_type() == Some(type_key));

    let indoor = selection.is_indoor_cycling();
    if indoor {
        table.retain_rows(|r| r.distance() != Some(0.0));
    } else {
        for row in table.rows_mut() {
            let adjusted = row.distance().map(|distance| {
                factors.adjust(
                    distance,
                    row.number(columns::ELEVATION_GAIN),
                    row.number(columns::ELEVATION_LOSS),
                )
            });
            row.distance_adj_elevation = adjusted;
        }
        table.mark_derived(columns::DISTANCE_ADJ_ELEVATION);
    }

    let use_adjusted = elevation_correction && !indoor;
    for row in table.rows_mut() {
        let distance = if use_adjusted {
            row.distance_adj_elevation
        } else {
            row.distance()
        };
        row.pace = match (row.duration(), distance) {
            (Some(duration), Some(distance)) => {
                Some(Pace::from_duration_distance(duration, distance))
            }
            _ => None,
        };
    }
    table.mark_derived(columns::PACE);

    tracing::debug!(
        activity = %selection,
        elevation_correction = use_adjusted,
        rows = table.len(),
        "Derived activity metrics"
    );

    table
}
