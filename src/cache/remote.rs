//! Remote source contract

use async_trait::async_trait;

use super::error::NetworkError;
use super::store::Record;

/// Authoritative source of a collection, usually a network API
///
/// Implementations know nothing about caching. Each call is one round-trip and
/// must enforce its own request timeout, reporting it as a [`NetworkError`].
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// The record type this source produces
    type Record: Record;

    /// Fetches a fresh copy of the whole collection
    async fn fetch_all(&self) -> Result<Vec<Self::Record>, NetworkError>;

    /// Searches the remote collection; results are never cached
    async fn search(&self, query: &str) -> Result<Vec<Self::Record>, NetworkError>;
}
