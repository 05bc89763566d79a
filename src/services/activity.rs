// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity loading for a dashboard session.
//!
//! Handles the fetch half of every request:
//! 1. Serve the raw records from the session cache or Garmin Connect
//! 2. Normalize them into an [`ActivityTable`]
//!
//! The table is rebuilt on every call so that a cache hit never hands out
//! a view derived with stale parameters.

use crate::error::Result;
use crate::models::ActivityTable;
use crate::services::garmin::{ActivityQuery, GarminService};
use crate::services::session::DashboardSession;
use crate::services::table;

pub struct ActivityLoader<'a> {
    garmin: &'a GarminService,
}

impl<'a> ActivityLoader<'a> {
    pub fn new(garmin: &'a GarminService) -> Self {
        Self { garmin }
    }

    /// Fetch (or reuse) the records for `query` and build the table.
    pub async fn load(
        &self,
        session: &DashboardSession,
        query: &ActivityQuery,
    ) -> Result<ActivityTable> {
        tracing::debug!(
            start = %query.start,
            end = %query.end,
            activity_type = ?query.activity_type,
            "Loading activities"
        );

        let records = self.garmin.fetch_cached(session, query).await?;
        table::build(records.as_ref().clone())
    }
}
