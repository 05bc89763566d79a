// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Garmin activity records and activity categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One raw activity as returned by the activity search endpoint.
///
/// The document is kept opaque; only the fields named in [`columns`] are
/// interpreted.
pub type ActivityRecord = serde_json::Value;

/// Column names used by the analysis pipeline.
pub mod columns {
    pub const START_TIME_LOCAL: &str = "startTimeLocal";
    pub const ACTIVITY_TYPE: &str = "activityType";
    /// Nested key inside the raw `activityType` document.
    pub const TYPE_KEY: &str = "typeKey";
    pub const DISTANCE: &str = "distance";
    pub const DURATION: &str = "duration";
    pub const ELEVATION_GAIN: &str = "elevationGain";
    pub const ELEVATION_LOSS: &str = "elevationLoss";
    pub const AVERAGE_HR: &str = "averageHR";

    // Derived
    pub const DISTANCE_ADJ_ELEVATION: &str = "distanceAdjElevation";
    pub const PACE: &str = "pace";

    /// Owner and device fields that never feed a metric and are removed
    /// before rows leave the service.
    pub const IDENTITY: &[&str] = &[
        "ownerId",
        "ownerDisplayName",
        "eventType",
        "ownerFullName",
        "ownerProfileImageUrlSmall",
        "ownerProfileImageUrlMedium",
        "ownerProfileImageUrlLarge",
        "userRoles",
        "privacy",
        "summarizedDiveInfo",
        "manufacturer",
    ];
}

/// The single activity category an analysis run is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    #[default]
    Running,
    Cycling,
    IndoorCycling,
    /// Any other Garmin `typeKey` (e.g. "trail_running", "hiking").
    Other(String),
}

impl ActivityKind {
    /// Garmin `typeKey` for this category.
    pub fn type_key(&self) -> &str {
        match self {
            ActivityKind::Running => "running",
            ActivityKind::Cycling => "cycling",
            ActivityKind::IndoorCycling => "indoor_cycling",
            ActivityKind::Other(key) => key,
        }
    }

    pub fn from_type_key(key: &str) -> Self {
        match key {
            "running" => ActivityKind::Running,
            "cycling" => ActivityKind::Cycling,
            "indoor_cycling" => ActivityKind::IndoorCycling,
            other => ActivityKind::Other(other.to_string()),
        }
    }

    /// Indoor trainers record no real ground distance or elevation.
    pub fn is_indoor_cycling(&self) -> bool {
        matches!(self, ActivityKind::IndoorCycling)
    }

    /// Whether a pace window is applied when the caller does not say.
    pub fn filters_pace_by_default(&self) -> bool {
        matches!(self, ActivityKind::Running)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_key())
    }
}

impl FromStr for ActivityKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_type_key(s))
    }
}

impl From<String> for ActivityKind {
    fn from(key: String) -> Self {
        Self::from_type_key(&key)
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        kind.type_key().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key_round_trip() {
        for key in ["running", "cycling", "indoor_cycling", "hiking"] {
            assert_eq!(ActivityKind::from_type_key(key).type_key(), key);
        }
        assert_eq!(
            ActivityKind::from_type_key("hiking"),
            ActivityKind::Other("hiking".to_string())
        );
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&ActivityKind::IndoorCycling).unwrap();
        assert_eq!(json, "\"indoor_cycling\"");

        let kind: ActivityKind = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(kind, ActivityKind::Running);
    }

    #[test]
    fn test_pace_filter_default_only_for_running() {
        assert!(ActivityKind::Running.filters_pace_by_default());
        assert!(!ActivityKind::Cycling.filters_pace_by_default());
        assert!(!ActivityKind::Other("trail_running".into()).filters_pace_by_default());
    }
}
