//! Read-through cache coordinator
//!
//! Combines a [`LocalStore`] and a [`RemoteSource`] under one policy:
//!
//! - a non-empty, fresh local collection is served without touching the network
//! - otherwise the remote collection is fetched, persisted and returned
//! - if that fetch fails, whatever the local store still holds is returned,
//!   even when stale; the network error only surfaces when there is nothing
//!   to fall back to
//!
//! The coordinator keeps no state of its own between calls.

use tracing::{debug, info, warn};

use super::error::CacheError;
use super::remote::RemoteSource;
use super::store::LocalStore;

/// Where the records of a [`CachedRead`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Local collection within the freshness window
    Fresh,
    /// Fetched from the remote source and persisted
    Remote,
    /// Remote fetch failed; local collection returned despite being stale
    StaleFallback,
}

/// Result of a read through the cache, including where the data came from
#[derive(Debug, Clone)]
pub struct CachedRead<T> {
    /// The records
    pub records: Vec<T>,
    /// Origin of the records
    pub source: ReadSource,
}

impl<T> CachedRead<T> {
    /// Whether the records may be older than the freshness window
    pub fn is_stale(&self) -> bool {
        self.source == ReadSource::StaleFallback
    }
}

/// Staleness-aware read-through cache with degrade-on-failure
pub struct ReadThroughCache<S, R> {
    store: S,
    remote: R,
}

impl<S, R> ReadThroughCache<S, R>
where
    S: LocalStore,
    R: RemoteSource<Record = S::Record>,
{
    /// Creates a coordinator over the given store and remote source
    pub fn new(store: S, remote: R) -> Self {
        Self { store, remote }
    }

    /// Returns the local store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the current records, refreshing them if needed
    pub async fn get_all(&self) -> Result<Vec<S::Record>, CacheError> {
        self.fetch().await.map(|read| read.records)
    }

    /// Returns the current records along with where they came from
    ///
    /// # Returns
    /// * `Ok(CachedRead)` with `ReadSource::Fresh` when served from a fresh local collection
    /// * `Ok(CachedRead)` with `ReadSource::Remote` after a successful refresh
    /// * `Ok(CachedRead)` with `ReadSource::StaleFallback` when the refresh failed
    ///   but local records exist
    /// * `Err(CacheError::Network)` when the refresh failed and nothing is cached
    /// * `Err(CacheError::Persistence)` when the refresh succeeded but saving failed
    pub async fn fetch(&self) -> Result<CachedRead<S::Record>, CacheError> {
        let cached = self.read_local().await;
        if !cached.is_empty() && !self.store.is_stale().await {
            debug!(count = cached.len(), "serving fresh local collection");
            return Ok(CachedRead {
                records: cached,
                source: ReadSource::Fresh,
            });
        }

        match self.remote.fetch_all().await {
            Ok(records) => {
                self.store.save(&records).await?;
                info!(count = records.len(), "refreshed collection from remote");
                Ok(CachedRead {
                    records,
                    source: ReadSource::Remote,
                })
            }
            Err(err) => {
                let fallback = self.read_local().await;
                if fallback.is_empty() {
                    return Err(err.into());
                }
                warn!(
                    count = fallback.len(),
                    error = %err,
                    "remote fetch failed, serving stale local collection"
                );
                Ok(CachedRead {
                    records: fallback,
                    source: ReadSource::StaleFallback,
                })
            }
        }
    }

    /// Fetches from the remote source regardless of freshness
    ///
    /// Failures are returned to the caller; stale local data is never
    /// substituted.
    pub async fn refresh(&self) -> Result<Vec<S::Record>, CacheError> {
        let records = self.remote.fetch_all().await?;
        self.store.save(&records).await?;
        info!(count = records.len(), "force-refreshed collection from remote");
        Ok(records)
    }

    /// Searches the remote source without consulting or updating the store
    ///
    /// A blank query returns no results without a network call.
    pub async fn search(&self, query: &str) -> Result<Vec<S::Record>, CacheError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.remote.search(query).await?)
    }

    /// Empties the local store
    pub async fn clear(&self) -> Result<(), CacheError> {
        Ok(self.store.clear().await?)
    }

    /// Reads the local collection, treating a read failure as a miss
    async fn read_local(&self) -> Vec<S::Record> {
        match self.store.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to read local collection");
                Vec::new()
            }
        }
    }
}
