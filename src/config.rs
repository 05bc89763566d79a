//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honoured for local
//! development.

use crate::services::filter::NullPolicy;
use crate::services::metrics::ElevationFactors;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://connectapi.garmin.com";
const DEFAULT_AUTH_URL: &str = "https://connectapi.garmin.com/oauth-service/oauth/exchange/user/2.0";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// JWT signing key for dashboard session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Garmin Connect ---
    /// Base URL of the activity API
    pub garmin_api_url: String,
    /// Credential login endpoint
    pub garmin_auth_url: String,
    /// Where the opaque vendor session blob is persisted (one per deployment)
    pub session_file: PathBuf,
    /// Timeout applied to every vendor request
    pub http_timeout: Duration,
    /// How long a fetch result is reused before hitting the vendor again
    pub fetch_cache_ttl: Duration,

    // --- Analysis ---
    pub elevation_factors: ElevationFactors,
    /// Default null handling when a request does not pick one
    pub null_policy: NullPolicy,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            garmin_api_url: "http://127.0.0.1:9".to_string(),
            garmin_auth_url: "http://127.0.0.1:9/login".to_string(),
            session_file: env::temp_dir().join("garmin-analytics-test-session.json"),
            http_timeout: Duration::from_secs(5),
            fetch_cache_ttl: Duration::from_secs(3600),
            elevation_factors: ElevationFactors::default(),
            null_policy: NullPolicy::StrictColumn,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = ElevationFactors::default();

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            garmin_api_url: env::var("GARMIN_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            garmin_auth_url: env::var("GARMIN_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            session_file: env::var("GARMIN_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("session.json")),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 30)?),
            fetch_cache_ttl: Duration::from_secs(parse_or("FETCH_CACHE_TTL_SECS", 3600)?),

            elevation_factors: ElevationFactors {
                up: parse_or("ELEVATION_UP_FACTOR", defaults.up)?,
                down: parse_or("ELEVATION_DOWN_FACTOR", defaults.down)?,
            },
            null_policy: parse_or("NULL_COLUMN_POLICY", NullPolicy::StrictColumn)?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than silently ignored.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
