//! CLI command implementations.
//!
//! Each submodule implements a group of CLI commands:
//! - [`account`] - Minting, owned assets, balances and the faucet
//! - [`orders`] - Posting, cancelling and listing orders
//! - [`trade`] - Quoting and buying
//! - [`init`] - Sample configuration

pub mod account;
pub mod init;
pub mod orders;
pub mod trade;

pub use account::AccountCommand;
pub use init::InitConfigCommand;
pub use orders::OrdersCommand;
pub use trade::TradeCommand;
