//! # mart-cli
//!
//! Stablemart command-line interface.
//!
//! Provides commands for:
//! - Minting assets and checking balances
//! - Posting and cancelling USD- or ETH-priced sell orders
//! - Quoting and buying orders at the current oracle rate
//!
//! Every invocation opens the marketplace state under the state directory,
//! applies one operation and exits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod session;

pub use cli::{Cli, Commands, Format, PostArgs};
pub use error::CliError;
pub use output::OutputFormat;
