//! Price resolution.
//!
//! Converts an order's ask into the native amount a buyer must pay, using the
//! oracle reading supplied with the call. Readings are never cached: every
//! resolution uses exactly the reading it is handed.
//!
//! # Rounding
//!
//! `required = floor(price_usd * rate)` with the rate held as an exact ratio,
//! so the only rounding is this final floor.
//! Results that do not fit fail with [`MarketError::AmountOverflow`] instead
//! of wrapping.

use chrono::{DateTime, Duration, Utc};
use mart_token::{UsdAmount, Wei};
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::oracle::{AssetPair, OracleReading};
use crate::order::Price;

/// Resolve a USD amount against a reading, without pair or age checks.
///
/// # Errors
///
/// Returns `StaleOrMissingReading` for a zero rate and `AmountOverflow` if
/// the native amount does not fit.
pub fn resolve_payment_amount(price_usd: UsdAmount, reading: &OracleReading) -> Result<Wei> {
    if reading.rate.is_zero() {
        return Err(MarketError::StaleOrMissingReading(format!(
            "{} reading has a zero rate",
            reading.pair
        )));
    }
    reading
        .rate
        .convert(price_usd)
        .ok_or(MarketError::AmountOverflow("resolving payment amount"))
}

/// Validates oracle readings and resolves order prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceResolver {
    pair: AssetPair,
    max_age: Option<Duration>,
}

impl PriceResolver {
    /// Resolver for `pair` that accepts readings of any age.
    #[must_use]
    pub const fn new(pair: AssetPair) -> Self {
        Self { pair, max_age: None }
    }

    /// Reject readings older than `max_age` at resolution time.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// The pair readings must be for.
    #[must_use]
    pub const fn pair(&self) -> &AssetPair {
        &self.pair
    }

    /// Maximum accepted reading age, if any.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Resolve `price` using the current time as the resolution instant.
    ///
    /// # Errors
    ///
    /// See [`PriceResolver::resolve_at`].
    pub fn resolve(&self, price: Price, reading: Option<&OracleReading>) -> Result<Wei> {
        self.resolve_at(price, reading, Utc::now())
    }

    /// Resolve `price` as of `now`.
    ///
    /// Native prices resolve to themselves and ignore the reading.
    ///
    /// # Errors
    ///
    /// Returns `StaleOrMissingReading` if a USD price has no reading, or the
    /// reading is for another pair, has a zero rate or is older than the
    /// maximum age. Returns `AmountOverflow` if the result does not fit.
    pub fn resolve_at(
        &self,
        price: Price,
        reading: Option<&OracleReading>,
        now: DateTime<Utc>,
    ) -> Result<Wei> {
        let usd = match price {
            Price::Native(wei) => return Ok(wei),
            Price::Usd(usd) => usd,
        };

        let reading = reading.ok_or_else(|| {
            MarketError::StaleOrMissingReading(format!("no {} reading supplied", self.pair))
        })?;
        self.check(reading, now)?;

        let required = resolve_payment_amount(usd, reading)?;
        debug!(
            pair = %self.pair,
            price = %usd,
            rate = %reading.rate,
            required = %required,
            "resolved payment amount"
        );
        Ok(required)
    }

    fn check(&self, reading: &OracleReading, now: DateTime<Utc>) -> Result<()> {
        if reading.pair != self.pair {
            return Err(MarketError::StaleOrMissingReading(format!(
                "reading is for {}, expected {}",
                reading.pair, self.pair
            )));
        }
        if let Some(max_age) = self.max_age {
            let age = reading.age_at(now);
            if age > max_age {
                return Err(MarketError::StaleOrMissingReading(format!(
                    "{} reading is {}s old (max {}s)",
                    self.pair,
                    age.num_seconds(),
                    max_age.num_seconds()
                )));
            }
        }
        Ok(())
    }
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::new(AssetPair::eth_usd())
    }
}
