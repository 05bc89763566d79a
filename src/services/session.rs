// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard sessions and their per-session fetch cache.
//!
//! Every logged-in browser gets its own [`DashboardSession`] holding the
//! Garmin credentials and a private cache. Nothing is shared between
//! sessions.

use crate::models::ActivityRecord;
use crate::services::garmin::{ActivityQuery, Credentials};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SESSION_ID_BYTES: usize = 32;

/// Lifetime of a dashboard session, matching its JWT.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Clone)]
struct CachedFetch {
    records: Arc<Vec<ActivityRecord>>,
    fetched_at: Instant,
}

/// Fetch results keyed by query, valid for a fixed TTL.
pub struct FetchCache {
    ttl: Duration,
    entries: DashMap<ActivityQuery, CachedFetch>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Cached records for `query` if still fresh.
    pub fn get(&self, query: &ActivityQuery) -> Option<Arc<Vec<ActivityRecord>>> {
        self.get_at(query, Instant::now())
    }

    fn get_at(&self, query: &ActivityQuery, now: Instant) -> Option<Arc<Vec<ActivityRecord>>> {
        let fresh = self
            .entries
            .get(query)
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
            .map(|e| e.records.clone());

        if fresh.is_none() {
            self.entries
                .remove_if(query, |_, e| now.saturating_duration_since(e.fetched_at) >= self.ttl);
        }
        fresh
    }

    pub fn insert(&self, query: ActivityQuery, records: Arc<Vec<ActivityRecord>>) {
        self.insert_at(query, records, Instant::now());
    }

    fn insert_at(&self, query: ActivityQuery, records: Arc<Vec<ActivityRecord>>, now: Instant) {
        // Entries for windows that are never read again would otherwise stay forever.
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.fetched_at) < self.ttl);
        self.entries.insert(
            query,
            CachedFetch {
                records,
                fetched_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State owned by one logged-in dashboard user.
pub struct DashboardSession {
    id: String,
    credentials: Credentials,
    cache: FetchCache,
    created_at: Instant,
}

impl DashboardSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    fn is_expired_at(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// All live dashboard sessions, keyed by random id.
///
/// Sessions expire [`SESSION_TTL`] after login, together with the
/// credentials and cache they hold.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<DashboardSession>>>,
    cache_ttl: Duration,
    session_ttl: Duration,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(cache_ttl: Duration) -> Self {
        Self::with_session_ttl(cache_ttl, SESSION_TTL)
    }

    pub fn with_session_ttl(cache_ttl: Duration, session_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            cache_ttl,
            session_ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Register a new session for `credentials` and return it.
    pub fn create(&self, credentials: Credentials) -> anyhow::Result<Arc<DashboardSession>> {
        self.create_at(credentials, Instant::now())
    }

    fn create_at(
        &self,
        credentials: Credentials,
        now: Instant,
    ) -> anyhow::Result<Arc<DashboardSession>> {
        self.prune_expired_at(now);

        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system RNG failure"))?;

        let session = Arc::new(DashboardSession {
            id: hex::encode(bytes),
            credentials,
            cache: FetchCache::new(self.cache_ttl),
            created_at: now,
        });
        self.sessions
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Live session for `id`. An expired session is removed instead.
    pub fn get(&self, id: &str) -> Option<Arc<DashboardSession>> {
        self.get_at(id, Instant::now())
    }

    fn get_at(&self, id: &str, now: Instant) -> Option<Arc<DashboardSession>> {
        let live = self
            .sessions
            .get(id)
            .filter(|s| !s.is_expired_at(self.session_ttl, now))
            .map(|s| s.clone());

        if live.is_none() {
            self.sessions
                .remove_if(id, |_, s| s.is_expired_at(self.session_ttl, now));
        }
        live
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    fn prune_expired_at(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| !s.is_expired_at(self.session_ttl, now));
        before.saturating_sub(self.sessions.len())
    }

    /// Forget a session and everything it cached.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
