//! Command-line interface parsing for CryptoTrack
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a [`Config`] plus the [`Command`] to run.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::{Config, ConfigError};

/// CryptoTrack - View top cryptocurrency markets with an offline-tolerant cache
#[derive(Parser, Debug)]
#[command(name = "cryptotrack")]
#[command(about = "Top cryptocurrency markets with a local freshness cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the CoinGecko-compatible API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Quote currency for prices
    #[arg(long, global = true, value_name = "CURRENCY")]
    pub currency: Option<String>,

    /// Number of coins fetched per refresh (1-250)
    #[arg(long, global = true, value_name = "N")]
    pub per_page: Option<u16>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// How long cached data stays fresh, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub max_age_secs: Option<u64>,

    /// Directory for the local cache (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// What to do
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show top coins, using the local cache while it is fresh
    Top,
    /// Fetch top coins from the API, ignoring the cache
    Refresh,
    /// Search coins by name or symbol (never cached)
    Search {
        /// One or more queries, searched concurrently
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Remove the local cache
    Clear,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with CLI values layered over the defaults
    /// * `Err(ConfigError)` if a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(url) = &cli.api_url {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(currency) = &cli.currency {
            config.api.vs_currency = currency.to_lowercase();
        }
        if let Some(per_page) = cli.per_page {
            config.api.per_page = per_page;
        }
        if let Some(secs) = cli.timeout_secs {
            config.api.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.max_age_secs {
            config.cache.max_age = Duration::from_secs(secs);
        }
        config.cache.dir = cli.cache_dir.clone();

        config.validate()?;
        Ok(config)
    }
}
