//! Keyed async query cache with staleness tracking and shared fetches.
//!
//! Entries store the JSON outcome of a keyed fetch together with its fetch
//! time. Reads follow a few rules:
//! - a fresh success is returned without touching the backend
//! - a stale success is returned immediately while a refresh runs in the
//!   background
//! - an invalidated or failed entry blocks until a new fetch resolves
//! - concurrent reads of the same key share a single in-flight fetch
//!
//! The inner mutex is never held across an await point.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::api::{ApiError, FieldErrors};

use super::QueryKey;

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the cache event channel.
/// 64 keeps a burst of page loads visible to a slow subscriber before old
/// events start dropping.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Freshness policy for a cached entry.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Age beyond which a stored success triggers a background refresh.
    pub stale_after: Duration,
}

impl QueryOptions {
    pub fn fresh_for_secs(secs: i64) -> Self {
        Self {
            stale_after: Duration::seconds(secs),
        }
    }

    /// Entries are served immediately but refreshed on every access.
    pub fn always_stale() -> Self {
        Self {
            stale_after: Duration::zero(),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::always_stale()
    }
}

/// Cache activity, broadcast to subscribers as fetches run.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A fetch started for the key.
    Fetching(QueryKey),
    /// A fetch stored a new value for the key.
    Updated(QueryKey),
    /// A fetch for the key failed.
    Failed(QueryKey),
    /// The key was marked invalid.
    Invalidated(QueryKey),
}

/// Error surfaced by cache reads. Clone so every waiter on a shared fetch
/// receives the same failure.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The underlying backend request failed.
    #[error("{0}")]
    Backend(Arc<ApiError>),

    /// A value could not be encoded to or decoded from its cached form.
    #[error("Cache codec error: {0}")]
    Decode(String),
}

impl CacheError {
    pub fn backend(&self) -> Option<&ApiError> {
        match self {
            CacheError::Backend(error) => Some(error),
            CacheError::Decode(_) => None,
        }
    }

    /// Per-field validation messages when the failure was a validation
    /// rejection.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.backend().and_then(ApiError::field_errors)
    }
}

impl From<ApiError> for CacheError {
    fn from(error: ApiError) -> Self {
        CacheError::Backend(Arc::new(error))
    }
}

type FetchSlot = Option<Result<Value, CacheError>>;

struct CacheEntry {
    outcome: Result<Value, CacheError>,
    fetched_at: DateTime<Utc>,
    stale_after: Duration,
    invalidated: bool,
}

impl CacheEntry {
    fn is_usable(&self) -> bool {
        !self.invalidated && self.outcome.is_ok()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at >= self.stale_after
    }
}

struct CacheInner {
    entries: HashMap<QueryKey, CacheEntry>,
    in_flight: HashMap<QueryKey, watch::Receiver<FetchSlot>>,
}

enum Role {
    Driver(watch::Sender<FetchSlot>),
    Follower(watch::Receiver<FetchSlot>),
}

/// Keyed query cache shared across the app.
/// Clone is cheap - all state lives behind an Arc.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
            events,
        }
    }

    /// Read the value for `key`, fetching through `fetch` when the cache
    /// cannot serve it.
    ///
    /// A usable stale entry is returned right away and refreshed in the
    /// background; invalidated and failed entries wait for a new result.
    /// When a fetch for the key is already running, the call waits for that
    /// result instead of issuing its own.
    pub async fn get<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let role = {
            let mut inner = self.lock_inner();
            let now = Utc::now();

            if let Some(entry) = inner.entries.get(&key) {
                if !entry.invalidated {
                    if let Ok(value) = &entry.outcome {
                        let value = value.clone();
                        if !entry.is_expired(now) {
                            return Self::decode_value(value);
                        }
                        // Stale hit: serve it now, refresh in the background
                        // unless a live fetch is already running.
                        let refresh_running = inner
                            .in_flight
                            .get(&key)
                            .is_some_and(|rx| rx.has_changed().is_ok());
                        if !refresh_running {
                            let (tx, rx) = watch::channel(None);
                            inner.in_flight.insert(key.clone(), rx);
                            drop(inner);
                            self.spawn_refresh(key, options, tx, fetch);
                        }
                        return Self::decode_value(value);
                    }
                }
            }

            match inner.in_flight.get(&key) {
                Some(rx) if rx.has_changed().is_ok() => Role::Follower(rx.clone()),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    inner.in_flight.insert(key.clone(), rx);
                    Role::Driver(tx)
                }
            }
        };

        match role {
            Role::Driver(tx) => self.drive(key, options, tx, fetch).await,
            Role::Follower(mut rx) => loop {
                if let Some(result) = rx.borrow_and_update().clone() {
                    return result.and_then(Self::decode_value);
                }
                if rx.changed().await.is_ok() {
                    continue;
                }

                // The driving task vanished without a result. Join a
                // restarted fetch if one exists, otherwise take over.
                let takeover = {
                    let mut inner = self.lock_inner();
                    if let Some(entry) = inner.entries.get(&key) {
                        if entry.is_usable() {
                            if let Ok(value) = &entry.outcome {
                                return Self::decode_value(value.clone());
                            }
                        }
                    }
                    match inner.in_flight.get(&key) {
                        Some(active) if active.has_changed().is_ok() => {
                            rx = active.clone();
                            None
                        }
                        _ => {
                            let (tx, new_rx) = watch::channel(None);
                            inner.in_flight.insert(key.clone(), new_rx);
                            Some(tx)
                        }
                    }
                };
                if let Some(tx) = takeover {
                    return self.drive(key, options, tx, fetch).await;
                }
            },
        }
    }

    /// Warm the cache for `key` without returning the value.
    ///
    /// Does nothing when a usable fresh entry exists or a fetch is already
    /// running. Failures are logged and swallowed.
    pub async fn prefetch<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetch: F)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let tx = {
            let mut inner = self.lock_inner();
            if let Some(entry) = inner.entries.get(&key) {
                if entry.is_usable() && !entry.is_expired(Utc::now()) {
                    return;
                }
            }
            if let Some(rx) = inner.in_flight.get(&key) {
                if rx.has_changed().is_ok() {
                    return;
                }
            }
            let (tx, rx) = watch::channel(None);
            inner.in_flight.insert(key.clone(), rx);
            tx
        };

        if let Err(error) = self.drive(key.clone(), options, tx, fetch).await {
            debug!(key = %key, error = %error, "Prefetch failed");
        }
    }

    /// Store a value directly, as if it had just been fetched.
    pub fn put<T: Serialize>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        value: &T,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_value(value).map_err(|e| CacheError::Decode(e.to_string()))?;
        {
            let mut inner = self.lock_inner();
            inner.entries.insert(
                key.clone(),
                CacheEntry {
                    outcome: Ok(json),
                    fetched_at: Utc::now(),
                    stale_after: options.stale_after,
                    invalidated: false,
                },
            );
        }
        let _ = self.events.send(CacheEvent::Updated(key));
        Ok(())
    }

    /// Read the stored value for `key` without fetching.
    /// Invalidated and failed entries read as absent.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = {
            let inner = self.lock_inner();
            match inner.entries.get(key) {
                Some(entry) if entry.is_usable() => entry.outcome.as_ref().ok().cloned(),
                _ => None,
            }
        };
        value.and_then(|v| serde_json::from_value(v).ok())
    }

    /// Mark the entry for `key` invalid, forcing the next read to refetch.
    /// Unknown keys are a no-op.
    pub fn invalidate(&self, key: &QueryKey) {
        let marked = {
            let mut inner = self.lock_inner();
            match inner.entries.get_mut(key) {
                Some(entry) if !entry.invalidated => {
                    entry.invalidated = true;
                    true
                }
                _ => false,
            }
        };
        if marked {
            debug!(key = %key, "Invalidated cache entry");
            let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        }
    }

    /// Invalidate every entry whose key matches the predicate.
    /// Returns how many entries were marked.
    pub fn invalidate_matching<P>(&self, matches: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let marked: Vec<QueryKey> = {
            let mut inner = self.lock_inner();
            inner
                .entries
                .iter_mut()
                .filter_map(|(key, entry)| {
                    if !entry.invalidated && matches(key) {
                        entry.invalidated = true;
                        Some(key.clone())
                    } else {
                        None
                    }
                })
                .collect()
        };
        if !marked.is_empty() {
            debug!(count = marked.len(), "Invalidated matching cache entries");
        }
        for key in &marked {
            let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        }
        marked.len()
    }

    /// Subscribe to cache activity.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Number of fetches currently running. Drives busy indicators.
    pub fn in_flight_count(&self) -> usize {
        let mut inner = self.lock_inner();
        inner.in_flight.retain(|_, rx| rx.has_changed().is_ok());
        inner.in_flight.len()
    }

    async fn drive<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        tx: watch::Sender<FetchSlot>,
        fetch: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _ = self.events.send(CacheEvent::Fetching(key.clone()));
        debug!(key = %key, "Fetching");

        match fetch().await {
            Ok(value) => match serde_json::to_value(&value) {
                Ok(json) => {
                    self.store_outcome(&key, options, Ok(json.clone()));
                    let _ = tx.send(Some(Ok(json)));
                    Ok(value)
                }
                Err(e) => {
                    let error = CacheError::Decode(e.to_string());
                    self.store_outcome(&key, options, Err(error.clone()));
                    let _ = tx.send(Some(Err(error.clone())));
                    Err(error)
                }
            },
            Err(e) => {
                let error = CacheError::from(e);
                self.store_outcome(&key, options, Err(error.clone()));
                let _ = tx.send(Some(Err(error.clone())));
                Err(error)
            }
        }
    }

    fn spawn_refresh<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        tx: watch::Sender<FetchSlot>,
        fetch: F,
    ) where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(error) = cache.drive(key.clone(), options, tx, fetch).await {
                debug!(key = %key, error = %error, "Background refresh failed");
            }
        });
    }

    // A result landing after an invalidation still wins: it reflects the
    // backend as of after the write that triggered the invalidation.
    fn store_outcome(&self, key: &QueryKey, options: QueryOptions, outcome: Result<Value, CacheError>) {
        let event = match &outcome {
            Ok(_) => CacheEvent::Updated(key.clone()),
            Err(error) => {
                warn!(key = %key, error = %error, "Fetch failed");
                CacheEvent::Failed(key.clone())
            }
        };
        {
            let mut inner = self.lock_inner();
            inner.entries.insert(
                key.clone(),
                CacheEntry {
                    outcome,
                    fetched_at: Utc::now(),
                    stale_after: options.stale_after,
                    invalidated: false,
                },
            );
            inner.in_flight.remove(key);
        }
        let _ = self.events.send(event);
    }

    fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, CacheError> {
        serde_json::from_value(value).map_err(|e| CacheError::Decode(e.to_string()))
    }

    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        // Entries are plain data; a lock poisoned by a panicking reader is
        // still safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Tests
// ============================================================
