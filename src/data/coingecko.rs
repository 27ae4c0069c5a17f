//! CoinGecko API client
//!
//! This module fetches market data from the CoinGecko v3 API and converts the
//! wire format into [`Coin`] values. Decoding is defensive: only `id`, `symbol`
//! and `name` are required, and entries that fail to decode are skipped rather
//! than failing the whole page.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Coin, PriceChanges, Roi};
use crate::cache::{NetworkError, RemoteSource};
use crate::config::ApiConfig;

/// Price change windows requested from the markets endpoint
const PRICE_CHANGE_WINDOWS: &str = "1h,24h,7d,30d,200d,1y";

/// Client for fetching coin data from CoinGecko
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    vs_currency: String,
    per_page: u16,
}

impl CoinGeckoClient {
    /// Creates a new client whose requests time out after `config.timeout`
    pub fn new(config: &ApiConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a new client with a custom HTTP client
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            per_page: config.per_page,
        }
    }

    /// Performs a GET against `path` and returns the body of a 2xx response
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, NetworkError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "requesting");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "unexpected response status");
            return Err(NetworkError::Server {
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(classify_error)
    }
}

#[async_trait]
impl RemoteSource for CoinGeckoClient {
    type Record = Coin;

    async fn fetch_all(&self) -> Result<Vec<Coin>, NetworkError> {
        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", PRICE_CHANGE_WINDOWS.to_string()),
        ];
        let body = self.get("coins/markets", &query).await?;
        parse_markets(&body)
    }

    async fn search(&self, query: &str) -> Result<Vec<Coin>, NetworkError> {
        let body = self.get("search", &[("query", query.to_string())]).await?;
        parse_search(&body)
    }
}

/// Maps a reqwest error onto the network error taxonomy
fn classify_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Transport(format!("request timed out: {}", err))
    } else if err.is_connect() {
        NetworkError::NoConnectivity
    } else if err.is_decode() {
        NetworkError::Decode(err.to_string())
    } else {
        NetworkError::Transport(err.to_string())
    }
}

/// Parses a `/coins/markets` response body
pub fn parse_markets(body: &str) -> Result<Vec<Coin>, NetworkError> {
    let entries: Vec<Value> =
        serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))?;
    Ok(decode_entries(entries, MarketCoinDto::into_coin))
}

/// Parses a `/search` response body
///
/// Accepts either the `{ "coins": [...] }` search envelope or a bare
/// markets-style array.
pub fn parse_search(body: &str) -> Result<Vec<Coin>, NetworkError> {
    let payload: SearchPayload =
        serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))?;
    Ok(match payload {
        SearchPayload::Markets(entries) => decode_entries(entries, MarketCoinDto::into_coin),
        SearchPayload::Envelope { coins } => decode_entries(coins, SearchCoinDto::into_coin),
    })
}

/// Decodes each entry on its own, skipping the ones that don't fit `D`
fn decode_entries<D, F>(entries: Vec<Value>, convert: F) -> Vec<Coin>
where
    D: DeserializeOwned,
    F: Fn(D) -> Coin,
{
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<D>(entry) {
            Ok(dto) => Some(convert(dto)),
            Err(e) => {
                warn!(error = %e, "skipping malformed coin entry");
                None
            }
        })
        .collect()
}

/// Parses an ISO 8601 timestamp, dropping values that don't parse
fn parse_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Search response shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    Markets(Vec<Value>),
    Envelope { coins: Vec<Value> },
}

/// One entry of the `/coins/markets` response
#[derive(Debug, Deserialize)]
struct MarketCoinDto {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    total_volume: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    ath: Option<f64>,
    atl: Option<f64>,
    ath_date: Option<String>,
    atl_date: Option<String>,
    roi: Option<RoiDto>,
    price_change_percentage_1h_in_currency: Option<f64>,
    price_change_percentage_24h_in_currency: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    price_change_percentage_30d_in_currency: Option<f64>,
    price_change_percentage_200d_in_currency: Option<f64>,
    price_change_percentage_1y_in_currency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RoiDto {
    percentage: Option<f64>,
    currency: Option<String>,
    times: Option<f64>,
}

/// One entry of the `/search` response's `coins` array
#[derive(Debug, Deserialize)]
struct SearchCoinDto {
    id: String,
    symbol: String,
    name: String,
    market_cap_rank: Option<u32>,
    large: Option<String>,
    thumb: Option<String>,
}

impl MarketCoinDto {
    fn into_coin(self) -> Coin {
        Coin {
            image: self.image,
            current_price: self.current_price,
            market_cap: self.market_cap,
            market_cap_rank: self.market_cap_rank,
            total_volume: self.total_volume,
            price_change: PriceChanges {
                hour: self.price_change_percentage_1h_in_currency,
                day: self.price_change_percentage_24h_in_currency,
                week: self.price_change_percentage_7d_in_currency,
                month: self.price_change_percentage_30d_in_currency,
                days_200: self.price_change_percentage_200d_in_currency,
                year: self.price_change_percentage_1y_in_currency,
            },
            circulating_supply: self.circulating_supply,
            total_supply: self.total_supply,
            max_supply: self.max_supply,
            all_time_high: self.ath,
            all_time_low: self.atl,
            all_time_high_date: parse_date(self.ath_date.as_deref()),
            all_time_low_date: parse_date(self.atl_date.as_deref()),
            roi: self.roi.map(|roi| Roi {
                percentage: roi.percentage,
                currency: roi.currency,
                times: roi.times,
            }),
            ..Coin::new(self.id, self.symbol, self.name)
        }
    }
}

impl SearchCoinDto {
    fn into_coin(self) -> Coin {
        Coin {
            image: self.large.or(self.thumb),
            market_cap_rank: self.market_cap_rank,
            ..Coin::new(self.id, self.symbol, self.name)
        }
    }
}
