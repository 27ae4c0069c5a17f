//! Static configuration for CryptoTrack
//!
//! Holds the API settings and the cache freshness window. Values come from
//! command-line flags (see [`crate::cli`]) layered over the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Base URL for the CoinGecko v3 API
pub const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Quote currency for prices
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Number of coins fetched per refresh
pub const DEFAULT_PER_PAGE: u16 = 100;

/// Largest page size the markets endpoint accepts
pub const MAX_PER_PAGE: u16 = 250;

/// Request timeout for API calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a cached collection stays fresh
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Name of the cache document for the top-coins collection
pub const COINS_CACHE_NAME: &str = "coins";

/// Error types for configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The page size is outside what the API accepts
    #[error("Invalid page size: {0}. Must be between 1 and {max}", max = MAX_PER_PAGE)]
    InvalidPerPage(u16),

    /// No cache directory was given and none could be determined
    #[error("Could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// Settings for the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// Quote currency (e.g., "usd")
    pub vs_currency: String,
    /// Page size for the markets endpoint
    pub per_page: u16,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            per_page: DEFAULT_PER_PAGE,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Settings for the local cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Freshness window
    pub max_age: Duration,
    /// Cache directory; `None` means the XDG default
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            dir: None,
        }
    }
}

impl CacheSettings {
    /// Freshness window as a chrono duration, saturating on overflow
    pub fn max_age_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.max_age).unwrap_or(chrono::Duration::MAX)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheSettings,
}

impl Config {
    /// Checks values the API would reject
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.per_page == 0 || self.api.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(self.api.per_page));
        }
        Ok(())
    }
}
