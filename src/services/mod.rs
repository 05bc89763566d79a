// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod garmin;
pub mod metrics;
pub mod session;
pub mod table;
pub mod trend;

pub use activity::ActivityLoader;
pub use dashboard::{render, DashboardParams, DashboardView};
pub use filter::{FilterParams, NullPolicy, OpenRange};
pub use garmin::{ActivityQuery, Credentials, GarminClient, GarminService, SessionFile};
pub use metrics::ElevationFactors;
pub use session::{DashboardSession, SessionStore};
