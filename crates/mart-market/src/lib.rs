//! # mart-market
//!
//! USD-priced escrow marketplace with oracle settlement.
//!
//! This crate provides:
//!
//! - Order ledger with one-way `Open -> Filled | Cancelled` transitions
//! - Asset custody adapter escrowing listed assets
//! - Price resolution from USD to native currency using oracle readings
//! - Settlement engine for atomic buy and cancel
//! - Client façade and TOML configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod custody;
pub mod error;
pub mod ledger;
pub mod oracle;
pub mod order;
pub mod pricing;
pub mod settlement;

pub use client::MarketClient;
pub use config::{MarketConfig, Network, OracleConfig, SettlementConfig};
pub use custody::CustodyAdapter;
pub use error::{MarketError, Result};
pub use ledger::{OrderLedger, PendingClose};
pub use oracle::{AssetPair, OracleReading, PriceFeed, StaticPriceFeed};
pub use order::{Order, OrderId, OrderStatus, Price};
pub use pricing::{resolve_payment_amount, PriceResolver};
pub use settlement::{Marketplace, RefundPolicy, SettlementReceipt};
