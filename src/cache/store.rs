//! Local store contract and its in-memory and on-disk implementations
//!
//! A local store holds one collection of records plus a single last-updated
//! timestamp shared by the whole collection. Every save replaces the collection
//! entirely; nothing is ever merged.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::error::PersistenceError;

/// A value that can live in a cached collection
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Identity key; a collection holds at most one record per id
    fn id(&self) -> &str;

    /// Ordering used by [`LocalStore::fetch_all`]
    ///
    /// Must be a total order so repeated reads return the same sequence.
    fn display_order(&self, other: &Self) -> Ordering {
        self.id().cmp(other.id())
    }
}

/// Persistent holder of the last fetched collection
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// The record type this store holds
    type Record: Record;

    /// Atomically replaces the whole collection and stamps the current time
    async fn save(&self, records: &[Self::Record]) -> Result<(), PersistenceError>;

    /// Returns the current collection in display order
    async fn fetch_all(&self) -> Result<Vec<Self::Record>, PersistenceError>;

    /// Empties the collection
    async fn clear(&self) -> Result<(), PersistenceError>;

    /// Whether the collection is empty or older than the freshness window
    async fn is_stale(&self) -> bool;

    /// When the collection was last replaced, if ever
    async fn last_updated(&self) -> Option<DateTime<Utc>>;
}

/// Deduplicates by id (last occurrence wins) and sorts into display order
fn normalize<T: Record>(records: &[T]) -> Vec<T> {
    let mut by_id: HashMap<&str, &T> = HashMap::with_capacity(records.len());
    for record in records {
        by_id.insert(record.id(), record);
    }

    let mut normalized: Vec<T> = by_id.into_values().cloned().collect();
    normalized.sort_by(|a, b| a.display_order(b));
    normalized
}

fn is_expired(updated_at: DateTime<Utc>, max_age: Duration) -> bool {
    Utc::now() - updated_at > max_age
}

#[derive(Debug)]
struct Snapshot<T> {
    records: Vec<T>,
    updated_at: Option<DateTime<Utc>>,
}

/// Local store that keeps the collection in process memory
///
/// Collection and timestamp sit behind one lock, so readers never observe a
/// half-replaced collection.
#[derive(Debug)]
pub struct MemoryStore<T> {
    snapshot: RwLock<Snapshot<T>>,
    max_age: Duration,
}

impl<T: Record> MemoryStore<T> {
    /// Creates an empty store with the given freshness window
    pub fn new(max_age: Duration) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                records: Vec::new(),
                updated_at: None,
            }),
            max_age,
        }
    }

    /// Creates a store seeded with a collection replaced at `updated_at`
    pub fn with_snapshot(records: Vec<T>, updated_at: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                records: normalize(&records),
                updated_at: Some(updated_at),
            }),
            max_age,
        }
    }
}

#[async_trait]
impl<T: Record> LocalStore for MemoryStore<T> {
    type Record = T;

    async fn save(&self, records: &[T]) -> Result<(), PersistenceError> {
        let records = normalize(records);
        let mut snapshot = self.snapshot.write().await;
        snapshot.records.clear();
        snapshot.records.extend(records);
        snapshot.updated_at = Some(Utc::now());
        debug!(count = snapshot.records.len(), "replaced in-memory collection");
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<T>, PersistenceError> {
        Ok(self.snapshot.read().await.records.clone())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.records.clear();
        snapshot.updated_at = None;
        Ok(())
    }

    async fn is_stale(&self) -> bool {
        let snapshot = self.snapshot.read().await;
        match snapshot.updated_at {
            Some(updated_at) if !snapshot.records.is_empty() => {
                is_expired(updated_at, self.max_age)
            }
            _ => true,
        }
    }

    async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.updated_at
    }
}

/// Document written to disk by [`FileStore`]
#[derive(Debug, Serialize, Deserialize)]
struct StoredCollection<R> {
    /// When the collection was last replaced
    updated_at: DateTime<Utc>,
    /// The records, already in display order
    records: R,
}

/// Local store that persists the collection as a JSON file
///
/// The file lives in an XDG-compliant cache directory (`~/.cache/cryptotrack/`
/// on Linux) unless a directory is given. Writes go to a temporary sibling file
/// that is renamed over the target, so a failed write leaves the previous
/// collection intact.
#[derive(Debug)]
pub struct FileStore<T> {
    /// Full path of the cache document
    path: PathBuf,
    /// Freshness window
    max_age: Duration,
    /// Serializes writers so renames never interleave
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> FileStore<T> {
    /// Creates a FileStore in the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new(name: &str, max_age: Duration) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "cryptotrack")?;
        Some(Self::with_dir(project_dirs.cache_dir(), name, max_age))
    }

    /// Creates a FileStore with a custom cache directory
    pub fn with_dir(cache_dir: impl AsRef<Path>, name: &str, max_age: Duration) -> Self {
        Self {
            path: cache_dir.as_ref().join(format!("{}.json", name)),
            max_age,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    /// Returns the path of the cache document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cache document, `None` if it has never been written
    async fn read_document(&self) -> Result<Option<StoredCollection<Vec<T>>>, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&self.path, source)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl<T: Record> LocalStore for FileStore<T> {
    type Record = T;

    async fn save(&self, records: &[T]) -> Result<(), PersistenceError> {
        let records = normalize(records);
        let document = StoredCollection {
            updated_at: Utc::now(),
            records: records.as_slice(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(source) = tokio::fs::write(&tmp_path, json).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(&tmp_path, source));
        }
        if let Err(source) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(&self.path, source));
        }

        debug!(
            count = records.len(),
            path = %self.path.display(),
            "saved collection to cache"
        );
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<T>, PersistenceError> {
        Ok(self
            .read_document()
            .await?
            .map(|document| document.records)
            .unwrap_or_default())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&self.path, source)),
        }
    }

    async fn is_stale(&self) -> bool {
        match self.read_document().await {
            Ok(Some(document)) => {
                document.records.is_empty() || is_expired(document.updated_at, self.max_age)
            }
            Ok(None) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable cache, treating as stale");
                true
            }
        }
    }

    async fn last_updated(&self) -> Option<DateTime<Utc>> {
        match self.read_document().await {
            Ok(document) => document.map(|document| document.updated_at),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable cache");
                None
            }
        }
    }
}
