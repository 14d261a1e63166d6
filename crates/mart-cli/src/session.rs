//! Building a [`MarketClient`] from flags, environment and config file.

use std::path::PathBuf;

use mart_market::{MarketClient, MarketConfig, PriceFeed, StaticPriceFeed};
use mart_token::UsdAmount;
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;

/// State directory used when neither the flag nor the config names one.
pub const DEFAULT_STATE_DIR: &str = ".stablemart";

/// Resolve the effective configuration. Flags override the file.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the result is
/// invalid.
pub fn load_config(cli: &Cli) -> Result<MarketConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => MarketConfig::from_file(path)?,
        None => MarketConfig::default(),
    };

    if let Some(dir) = &cli.state_dir {
        config.state_dir = Some(dir.clone());
    }
    if config.state_dir.is_none() {
        config.state_dir = Some(PathBuf::from(DEFAULT_STATE_DIR));
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = chain_id;
    }
    if let Some(price) = &cli.eth_usd {
        let usd: UsdAmount = price
            .parse()
            .map_err(|e| CliError::invalid_amount("--eth-usd", e))?;
        config.oracle.usd_per_native = Some(usd);
    }

    config.validate()?;
    Ok(config)
}

/// Build the oracle feed serving the configured native price.
///
/// # Errors
///
/// Returns an error if the configured price is zero.
pub fn price_feed(config: &MarketConfig) -> Result<Box<dyn PriceFeed>, CliError> {
    let feed = match config.oracle.usd_per_native {
        Some(usd) => StaticPriceFeed::new().with_usd_price(config.oracle.pair.clone(), usd)?,
        None => StaticPriceFeed::new(),
    };
    Ok(Box::new(feed))
}

/// Connect to the marketplace described by `cli`.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the network is unsupported
/// or persisted state cannot be loaded.
pub fn connect(cli: &Cli) -> Result<MarketClient, CliError> {
    let config = load_config(cli)?;
    debug!(
        chain_id = config.chain_id,
        state_dir = ?config.state_dir,
        pair = %config.oracle.pair,
        "resolved configuration"
    );
    let feed = price_feed(&config)?;
    Ok(MarketClient::connect(&config, feed)?)
}
