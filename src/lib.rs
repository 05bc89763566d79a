// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Garmin Analytics: training charts from Garmin Connect activities
//!
//! This crate provides the backend API for the dashboard: it fetches a
//! user's activities from Garmin Connect, derives pace and
//! elevation-adjusted distance, filters by heart rate and pace, and
//! aggregates weekly volume.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{GarminService, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub garmin: GarminService,
    pub sessions: SessionStore,
}
