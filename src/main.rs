//! CryptoTrack - View top cryptocurrency markets from the terminal
//!
//! Shows the top coins by market cap from the CoinGecko API, serving a local
//! cache while it is fresh and falling back to it when the API is unreachable.

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use cryptotrack::cache::{CacheError, FileStore, LocalStore, ReadThroughCache};
use cryptotrack::cli::{Cli, Command};
use cryptotrack::config::{Config, ConfigError, COINS_CACHE_NAME};
use cryptotrack::data::{Coin, CoinGeckoClient};

type CoinCache = ReadThroughCache<FileStore<Coin>, CoinGeckoClient>;

/// Errors that end the process
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            AppError::Cache(err) => Some(err.recovery_suggestion()),
            _ => None,
        }
    }
}

/// Builds the coordinator from configuration
fn build_cache(config: &Config) -> Result<CoinCache, AppError> {
    let max_age = config.cache.max_age_chrono();
    let store = match &config.cache.dir {
        Some(dir) => FileStore::with_dir(dir, COINS_CACHE_NAME, max_age),
        None => FileStore::new(COINS_CACHE_NAME, max_age).ok_or(ConfigError::NoCacheDir)?,
    };
    let remote = CoinGeckoClient::new(&config.api).map_err(CacheError::from)?;
    Ok(ReadThroughCache::new(store, remote))
}

/// Renders coins as one line each
fn render_coins(coins: &[Coin], currency: &str) -> String {
    coins
        .iter()
        .map(|coin| {
            let rank = coin
                .market_cap_rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            let price = coin
                .current_price
                .map(|p| format!("{:.2} {}", p, currency.to_uppercase()))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{:>4}  {:<8} {:<24} {}",
                rank,
                coin.symbol.to_uppercase(),
                coin.name,
                price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_coins(coins: &[Coin], config: &Config, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(coins)?);
    } else if !coins.is_empty() {
        println!("{}", render_coins(coins, &config.api.vs_currency));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_cli(&cli)?;
    let cache = build_cache(&config)?;

    match &cli.command {
        Command::Top => {
            let read = cache.fetch().await?;
            if read.is_stale() {
                let since = cache
                    .store()
                    .last_updated()
                    .await
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "an earlier run".to_string());
                eprintln!("note: API unavailable, showing stale data cached at {}", since);
            }
            print_coins(&read.records, &config, cli.json)?;
        }
        Command::Refresh => {
            let coins = cache.refresh().await?;
            print_coins(&coins, &config, cli.json)?;
        }
        Command::Search { queries } => {
            let results =
                futures::future::join_all(queries.iter().map(|query| cache.search(query))).await;

            let mut by_query: BTreeMap<&str, Vec<Coin>> = BTreeMap::new();
            for (query, result) in queries.iter().zip(results) {
                by_query.insert(query.as_str(), result?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&by_query)?);
            } else {
                for (query, coins) in &by_query {
                    if coins.is_empty() {
                        continue;
                    }
                    println!("{}:", query.trim());
                    println!("{}", render_coins(coins, &config.api.vs_currency));
                }
            }
        }
        Command::Clear => {
            cache.clear().await?;
            println!("Cache cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            if let Some(hint) = err.recovery_suggestion() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_coins_formats_rank_symbol_and_price() {
        let coin = Coin {
            market_cap_rank: Some(1),
            current_price: Some(67187.456),
            ..Coin::new("bitcoin", "btc", "Bitcoin")
        };

        let line = render_coins(&[coin], "usd");
        assert!(line.contains("BTC"));
        assert!(line.contains("Bitcoin"));
        assert!(line.contains("67187.46 USD"));
        assert!(line.trim_start().starts_with('1'));
    }

    #[test]
    fn test_render_coins_missing_values() {
        let line = render_coins(&[Coin::new("mystery", "mys", "Mystery")], "usd");
        assert!(line.contains("MYS"));
        assert!(line.trim_end().ends_with('-'));
    }
}
