//! Core data models for CryptoTrack
//!
//! This module contains the coin snapshot type held by the local cache and the
//! CoinGecko client that produces it.

pub mod coingecko;

pub use coingecko::CoinGeckoClient;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Record;

/// A snapshot of one cryptocurrency's market data
///
/// Only the identity and display fields are guaranteed; everything else is
/// whatever the upstream API chose to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Unique identifier (e.g., "bitcoin")
    pub id: String,
    /// Ticker symbol (e.g., "btc")
    pub symbol: String,
    /// Human-readable name
    pub name: String,
    /// Logo URL
    pub image: Option<String>,
    /// Current price in the quote currency
    pub current_price: Option<f64>,
    /// Market capitalisation in the quote currency
    pub market_cap: Option<f64>,
    /// Rank by market capitalisation
    pub market_cap_rank: Option<u32>,
    /// 24h trading volume in the quote currency
    pub total_volume: Option<f64>,
    /// Percentage price changes over several windows
    #[serde(default)]
    pub price_change: PriceChanges,
    /// Coins currently in circulation
    pub circulating_supply: Option<f64>,
    /// Total supply
    pub total_supply: Option<f64>,
    /// Maximum supply, if capped
    pub max_supply: Option<f64>,
    /// All-time high price
    pub all_time_high: Option<f64>,
    /// All-time low price
    pub all_time_low: Option<f64>,
    /// When the all-time high was reached
    pub all_time_high_date: Option<DateTime<Utc>>,
    /// When the all-time low was reached
    pub all_time_low_date: Option<DateTime<Utc>>,
    /// Return on investment since launch, if reported
    pub roi: Option<Roi>,
}

/// Percentage price changes in the quote currency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChanges {
    pub hour: Option<f64>,
    pub day: Option<f64>,
    pub week: Option<f64>,
    pub month: Option<f64>,
    pub days_200: Option<f64>,
    pub year: Option<f64>,
}

/// Return on investment data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    /// ROI as a percentage
    pub percentage: Option<f64>,
    /// Currency the ROI is measured against
    pub currency: Option<String>,
    /// ROI as a multiplier
    pub times: Option<f64>,
}

impl Coin {
    /// Creates a coin with only the identity fields set
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image: None,
            current_price: None,
            market_cap: None,
            market_cap_rank: None,
            total_volume: None,
            price_change: PriceChanges::default(),
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
            all_time_high: None,
            all_time_low: None,
            all_time_high_date: None,
            all_time_low_date: None,
            roi: None,
        }
    }
}

impl Record for Coin {
    fn id(&self) -> &str {
        &self.id
    }

    /// Descending market cap, coins without one last, ties broken by id
    fn display_order(&self, other: &Self) -> Ordering {
        match (self.market_cap, other.market_cap) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}
