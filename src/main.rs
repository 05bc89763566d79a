// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Analytics API Server
//!
//! Serves heart-rate, pace and weekly volume charts computed from a
//! user's Garmin Connect activities.

use garmin_analytics::{
    config::Config,
    services::{GarminClient, GarminService, SessionFile, SessionStore},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Garmin Analytics API");

    let client = GarminClient::new(
        &config.garmin_api_url,
        &config.garmin_auth_url,
        config.http_timeout,
    )?;
    let session_file = SessionFile::new(config.session_file.clone());
    tracing::info!(
        api_url = %config.garmin_api_url,
        session_file = %session_file.path().display(),
        "Garmin Connect client initialized"
    );

    let sessions = SessionStore::new(config.fetch_cache_ttl);
    tracing::info!(
        ttl_secs = config.fetch_cache_ttl.as_secs(),
        null_policy = %config.null_policy,
        "Session store initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        garmin: GarminService::new(client, session_file),
        sessions,
    });

    // Sweep sessions that expired without an explicit logout
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper.sessions.prune_expired();
            if removed > 0 {
                tracing::info!(
                    removed,
                    remaining = sweeper.sessions.len(),
                    "Expired dashboard sessions removed"
                );
            }
        }
    });

    // Build router
    let app = garmin_analytics::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("garmin_analytics=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
