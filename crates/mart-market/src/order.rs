//! Order records and their lifecycle state.

use std::fmt;

use chrono::{DateTime, Utc};
use mart_token::{Address, AssetId, RegistryId, UsdAmount, Wei};
use serde::{Deserialize, Serialize};

/// Order identifier: the order's position in the ledger, assigned on
/// insertion and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create an order id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Listed; the marketplace holds the asset.
    Open,
    /// Bought; the asset went to the buyer and the payment to the seller.
    Filled,
    /// Withdrawn by the seller; the asset went back to the seller.
    Cancelled,
}

impl OrderStatus {
    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (Self::Open, Self::Filled | Self::Cancelled))
    }

    /// Returns true for `Filled` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Filled => write!(f, "Filled"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// The seller's ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "currency", content = "amount", rename_all = "lowercase")]
pub enum Price {
    /// Stable-unit price, converted to native currency at settlement time.
    Usd(UsdAmount),
    /// Fixed native-currency price; no oracle reading needed.
    Native(Wei),
}

impl Price {
    /// Whether the price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        match self {
            Self::Usd(usd) => usd.is_zero(),
            Self::Native(wei) => wei.is_zero(),
        }
    }

    /// Whether settling this price needs an oracle reading.
    #[must_use]
    pub const fn needs_reading(&self) -> bool {
        matches!(self, Self::Usd(_))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usd(usd) => write!(f, "{usd}"),
            Self::Native(wei) => write!(f, "{wei}"),
        }
    }
}

/// A sell order.
///
/// Fields are read-only outside the crate; every mutation goes through the
/// order ledger so the status can only move `Open -> Filled` or
/// `Open -> Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) registry: RegistryId,
    pub(crate) asset_id: AssetId,
    pub(crate) creator: Address,
    pub(crate) price: Price,
    pub(crate) status: OrderStatus,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) closed_at: Option<DateTime<Utc>>,
    pub(crate) buyer: Option<Address>,
}

impl Order {
    /// Order id.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Registry the asset belongs to.
    pub fn registry(&self) -> &RegistryId {
        &self.registry
    }

    /// Asset being sold.
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Seller who posted the order.
    pub fn creator(&self) -> &Address {
        &self.creator
    }

    /// Ask price.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Whether the order is still open.
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// When the order was posted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the order was filled or cancelled.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Buyer of a filled order.
    pub fn buyer(&self) -> Option<&Address> {
        self.buyer.as_ref()
    }
}
