// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod stats;
pub mod table;

pub use activity::{ActivityKind, ActivityRecord};
pub use stats::{WeekVolume, WeeklyVolume};
pub use table::{ActivityRow, ActivityTable, Pace};
