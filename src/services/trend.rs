// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Least-squares trend lines for chart series.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// `y = slope * x + intercept`, with `x` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares fit of degree one.
///
/// Returns `None` for fewer than two points or when all `x` are equal.
pub fn fit(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    // Centered sums keep precision with x around 1.7e9.
    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
