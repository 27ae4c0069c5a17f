//! Freshness cache for remote collections
//!
//! This module provides a read-through cache that serves a locally persisted
//! collection while it is younger than a freshness window, refreshes it from a
//! remote source when it is stale or empty, and degrades to the stale copy when
//! the remote source is unavailable.

mod error;
mod read_through;
mod remote;
mod store;

pub use error::{CacheError, ErrorKind, NetworkError, PersistenceError};
pub use read_through::{CachedRead, ReadSource, ReadThroughCache};
pub use remote::RemoteSource;
pub use store::{FileStore, LocalStore, MemoryStore, Record};
