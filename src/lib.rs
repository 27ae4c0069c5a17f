//! CryptoTrack Library
//!
//! This module exposes the cache core, the coin data layer, configuration and
//! CLI parsing for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
