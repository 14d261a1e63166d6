//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mart_token::Address;

use crate::error::CliError;

/// Stablemart - list assets priced in USD, settle in ETH.
#[derive(Parser, Debug, Clone)]
#[command(name = "stablemart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, env = "STABLEMART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding orders, assets and balances.
    #[arg(long, env = "STABLEMART_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Chain id to connect to (overrides the config file).
    #[arg(long, env = "STABLEMART_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Account acting on the marketplace.
    #[arg(short, long, env = "STABLEMART_ACCOUNT")]
    pub account: Option<String>,

    /// USD price of one ETH served as the oracle reading.
    #[arg(long, env = "STABLEMART_ETH_USD", value_name = "USD")]
    pub eth_usd: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The acting account.
    ///
    /// # Errors
    ///
    /// Returns an error if `--account` is missing or malformed.
    pub fn account(&self) -> Result<Address, CliError> {
        let raw = self.account.as_deref().ok_or_else(|| {
            CliError::InvalidArgument("--account (or STABLEMART_ACCOUNT) is required".into())
        })?;
        Address::new(raw).map_err(|e| CliError::InvalidArgument(e.to_string()))
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Mint a new asset to the account.
    Mint,

    /// List assets owned by the account.
    Owned,

    /// Credit free ETH to the account (local network only).
    Faucet {
        /// Amount of ETH to credit.
        #[arg(default_value = "10")]
        amount: String,
    },

    /// Show the account's ETH balance.
    Balance,

    /// List an owned asset for sale.
    Post(PostArgs),

    /// Cancel one of the account's open orders.
    Cancel {
        /// Order to cancel.
        order_id: u64,
    },

    /// Show the current ETH price of an order.
    Quote {
        /// Order to price.
        order_id: u64,
    },

    /// Buy an open order.
    ///
    /// Pays the current quote plus the configured buffer unless an explicit
    /// payment is given. Any excess is refunded under the default policy.
    Buy {
        /// Order to buy.
        order_id: u64,

        /// Exact ETH amount to pay.
        #[arg(long)]
        payment: Option<String>,
    },

    /// List orders.
    Orders {
        /// Include filled and cancelled orders.
        #[arg(long)]
        all: bool,
    },

    /// Generate a sample config file.
    InitConfig {
        /// Path to write config.
        #[arg(short, long, default_value = "stablemart.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the post command.
#[derive(Args, Debug, Clone)]
#[command(group(clap::ArgGroup::new("price").required(true).args(["usd", "eth"])))]
pub struct PostArgs {
    /// Asset to list.
    pub asset_id: u64,

    /// Price in USD, settled in ETH at the oracle rate.
    #[arg(long)]
    pub usd: Option<String>,

    /// Fixed price in ETH.
    #[arg(long)]
    pub eth: Option<String>,
}
