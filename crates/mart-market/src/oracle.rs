//! Oracle readings and the price-feed boundary.
//!
//! The marketplace never fetches prices itself: callers obtain a reading from
//! a [`PriceFeed`] and pass it into `buy`/`get_price`. Signature verification
//! of the underlying price update is the feed's responsibility.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mart_token::{Rate, UsdAmount};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

/// A traded pair, e.g. `ETH/USD`: `base` is the native currency, `quote` the
/// stable unit of account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPair {
    base: String,
    quote: String,
}

impl AssetPair {
    /// Create a pair from its two symbols.
    #[must_use]
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_ascii_uppercase(),
            quote: quote.into().to_ascii_uppercase(),
        }
    }

    /// The pair the reference deployment settles in.
    #[must_use]
    pub fn eth_usd() -> Self {
        Self::new("ETH", "USD")
    }

    /// Native currency symbol.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Stable unit symbol.
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl Default for AssetPair {
    fn default() -> Self {
        Self::eth_usd()
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for AssetPair {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains('/') =>
            {
                Ok(Self::new(base.trim(), quote.trim()))
            }
            _ => Err(MarketError::Config(format!(
                "invalid asset pair {s:?}, expected BASE/QUOTE"
            ))),
        }
    }
}

impl TryFrom<String> for AssetPair {
    type Error = MarketError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AssetPair> for String {
    fn from(pair: AssetPair) -> Self {
        pair.to_string()
    }
}

/// A timestamped exchange rate for one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReading {
    /// Pair the rate applies to.
    pub pair: AssetPair,
    /// ETH per one USD.
    pub rate: Rate,
    /// When the oracle observed the rate.
    pub timestamp: DateTime<Utc>,
}

impl OracleReading {
    /// Create a reading.
    #[must_use]
    pub const fn new(pair: AssetPair, rate: Rate, timestamp: DateTime<Utc>) -> Self {
        Self {
            pair,
            rate,
            timestamp,
        }
    }

    /// Build a reading from a quote of the native asset in USD (e.g. ETH at
    /// 2000 USD), the form most feeds publish.
    pub fn from_usd_price(
        pair: AssetPair,
        usd_per_native: UsdAmount,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let rate = Rate::from_usd_per_native(usd_per_native)?;
        Ok(Self::new(pair, rate, timestamp))
    }

    /// Age of the reading at `now`. Readings from the future have zero age.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.timestamp).max(chrono::Duration::zero())
    }
}

/// Source of the freshest reading for a pair (the oracle transport).
pub trait PriceFeed: Send + Sync {
    /// Latest reading for `pair`, or `None` when the feed has nothing.
    fn latest(&self, pair: &AssetPair) -> Option<OracleReading>;
}

/// A feed serving configured quotes, stamped with the time of each read.
#[derive(Debug, Default)]
pub struct StaticPriceFeed {
    quotes: RwLock<HashMap<AssetPair, Rate>>,
}

impl StaticPriceFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate served for `pair`.
    #[must_use]
    pub fn with_rate(self, pair: AssetPair, rate: Rate) -> Self {
        self.set_rate(pair, rate);
        self
    }

    /// Set the quote for `pair` from a USD price of the native asset.
    pub fn with_usd_price(self, pair: AssetPair, usd_per_native: UsdAmount) -> Result<Self> {
        let rate = Rate::from_usd_per_native(usd_per_native)?;
        Ok(self.with_rate(pair, rate))
    }

    /// Replace the rate served for `pair`.
    pub fn set_rate(&self, pair: AssetPair, rate: Rate) {
        self.quotes.write().insert(pair, rate);
    }
}

impl PriceFeed for StaticPriceFeed {
    fn latest(&self, pair: &AssetPair) -> Option<OracleReading> {
        self.quotes
            .read()
            .get(pair)
            .map(|rate| OracleReading::new(pair.clone(), *rate, Utc::now()))
    }
}
