//! Marketplace configuration.
//!
//! Loaded from TOML; every field has a default so an empty file describes a
//! local development marketplace:
//!
//! ```toml
//! chain_id = 31337
//! market_address = "marketplace"
//! registry_id = "example-nft"
//! state_dir = ".stablemart"
//!
//! [oracle]
//! pair = "ETH/USD"
//! max_age_secs = 180
//! usd_per_native = "2000"
//!
//! [settlement]
//! refund_policy = "refund_excess"
//! buy_buffer_bps = 100
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;
use mart_token::{Address, RegistryId, UsdAmount};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::oracle::AssetPair;
use crate::pricing::PriceResolver;
use crate::settlement::RefundPolicy;

/// Chain id of a local development node.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Chain id of the kovan testnet.
pub const KOVAN_CHAIN_ID: u64 = 42;

/// Networks the marketplace is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Local development node.
    Local,
    /// Kovan testnet.
    Kovan,
}

impl Network {
    /// Map a chain id to a supported network.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` for any other chain id.
    pub const fn from_chain_id(chain_id: u64) -> Result<Self> {
        match chain_id {
            LOCAL_CHAIN_ID => Ok(Self::Local),
            KOVAN_CHAIN_ID => Ok(Self::Kovan),
            _ => Err(MarketError::UnsupportedNetwork { chain_id }),
        }
    }

    /// Chain id of the network.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Local => LOCAL_CHAIN_ID,
            Self::Kovan => KOVAN_CHAIN_ID,
        }
    }

    /// Whether free funds may be minted.
    #[must_use]
    pub const fn allows_faucet(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Kovan => write!(f, "kovan"),
        }
    }
}

/// Oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Pair orders are priced against.
    pub pair: AssetPair,
    /// Readings older than this are rejected. `None` accepts any age.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
    /// USD price of one native unit served by the built-in feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_per_native: Option<UsdAmount>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            pair: AssetPair::eth_usd(),
            max_age_secs: Some(180),
            usd_per_native: None,
        }
    }
}

/// Settlement settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettlementConfig {
    /// What happens to over-payments.
    pub refund_policy: RefundPolicy,
    /// Buffer the client adds on top of a quote when buying, in basis points.
    pub buy_buffer_bps: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            refund_policy: RefundPolicy::default(),
            buy_buffer_bps: 100, // 1%
        }
    }
}

/// Top-level marketplace configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarketConfig {
    /// Chain the client connects to.
    pub chain_id: u64,
    /// The marketplace's own account.
    pub market_address: String,
    /// Asset registry listings are accepted from.
    pub registry_id: String,
    /// Where durable state lives. `None` keeps everything in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Oracle settings.
    pub oracle: OracleConfig,
    /// Settlement settings.
    pub settlement: SettlementConfig,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chain_id: LOCAL_CHAIN_ID,
            market_address: "marketplace".to_string(),
            registry_id: "example-nft".to_string(),
            state_dir: None,
            oracle: OracleConfig::default(),
            settlement: SettlementConfig::default(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MarketError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| MarketError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MarketError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            MarketError::Config(format!(
                "failed to write config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Validate the configuration.
    ///
    /// The chain id is checked on connect, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        Address::new(&self.market_address)
            .map_err(|e| MarketError::Config(format!("market_address: {e}")))?;

        if self.registry_id.trim().is_empty() {
            return Err(MarketError::Config("registry_id cannot be empty".to_string()));
        }

        if self.oracle.max_age_secs == Some(0) {
            return Err(MarketError::Config(
                "oracle.max_age_secs must be greater than 0".to_string(),
            ));
        }

        if self.oracle.usd_per_native.is_some_and(|p| p.is_zero()) {
            return Err(MarketError::Config(
                "oracle.usd_per_native must be greater than 0".to_string(),
            ));
        }

        if self.settlement.buy_buffer_bps > 10_000 {
            return Err(MarketError::Config(
                "settlement.buy_buffer_bps cannot exceed 10000".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured network.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` for an unknown chain id.
    pub const fn network(&self) -> Result<Network> {
        Network::from_chain_id(self.chain_id)
    }

    /// The marketplace account.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is malformed.
    pub fn market_address(&self) -> Result<Address> {
        Address::new(&self.market_address)
            .map_err(|e| MarketError::Config(format!("market_address: {e}")))
    }

    /// The accepted asset registry.
    pub fn registry_id(&self) -> RegistryId {
        RegistryId::new(self.registry_id.trim())
    }

    /// Resolver enforcing the configured pair and maximum reading age.
    pub fn resolver(&self) -> PriceResolver {
        let resolver = PriceResolver::new(self.oracle.pair.clone());
        match self.oracle.max_age_secs {
            Some(secs) => resolver.with_max_age(
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or(Duration::MAX),
            ),
            None => resolver,
        }
    }
}
