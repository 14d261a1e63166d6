//! Error types for mart-market.

use mart_token::{Address, AssetId, RegistryId, TokenError, Wei};
use thiserror::Error;

use crate::order::{OrderId, OrderStatus};

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
///
/// Every failing operation leaves the ledger, custody and balances exactly as
/// they were before the call.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The seller has not approved the marketplace to take custody.
    #[error("marketplace is not approved to transfer token {asset_id} of {registry}")]
    NotApproved {
        /// Registry holding the asset.
        registry: RegistryId,
        /// Asset being listed.
        asset_id: AssetId,
    },

    /// The caller is not allowed to act on this order.
    #[error("{requester} is not the creator of order {order_id}")]
    Unauthorized {
        /// Order being acted on.
        order_id: OrderId,
        /// Account that made the request.
        requester: Address,
    },

    /// The marketplace's own escrow account tried to sell or buy.
    #[error("{account} is the marketplace escrow account and cannot trade")]
    EscrowAccount {
        /// The escrow account.
        account: Address,
    },

    /// No order with this id exists.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order has already been filled or cancelled.
    #[error("order {order_id} is not open (status: {status})")]
    OrderNotOpen {
        /// Order being acted on.
        order_id: OrderId,
        /// Its current, terminal status.
        status: OrderStatus,
    },

    /// The offered payment is below the resolved price.
    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment {
        /// Amount resolved from the order price.
        required: Wei,
        /// Amount the buyer offered.
        offered: Wei,
    },

    /// No usable oracle reading was supplied.
    #[error("stale or missing price reading: {0}")]
    StaleOrMissingReading(String),

    /// Taking custody of the asset failed.
    #[error("custody take failed for token {asset_id} of {registry}: {reason}")]
    CustodyTakeFailed {
        /// Registry holding the asset.
        registry: RegistryId,
        /// Asset being escrowed.
        asset_id: AssetId,
        /// Why the registry refused.
        reason: String,
    },

    /// Releasing custody of the asset failed.
    #[error("custody release failed for token {asset_id} of {registry}: {reason}")]
    CustodyReleaseFailed {
        /// Registry holding the asset.
        registry: RegistryId,
        /// Asset being released.
        asset_id: AssetId,
        /// Why the registry refused.
        reason: String,
    },

    /// The asset already backs an open order.
    #[error("token {asset_id} of {registry} is already listed by order {order_id}")]
    AlreadyListed {
        /// Registry holding the asset.
        registry: RegistryId,
        /// Asset being listed.
        asset_id: AssetId,
        /// The open order holding it.
        order_id: OrderId,
    },

    /// The registry is not known to the marketplace.
    #[error("unknown asset registry: {0}")]
    UnknownRegistry(RegistryId),

    /// The listing price is not acceptable.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Moving the payment failed.
    #[error("payment failed: {0}")]
    Payment(String),

    /// An amount computation overflowed.
    #[error("amount overflow while {0}")]
    AmountOverflow(&'static str),

    /// The client is connected to a network the marketplace is not deployed on.
    #[error("unsupported network (chain id {chain_id}); connect to a local node or the kovan testnet and retry")]
    UnsupportedNetwork {
        /// Chain id that was requested.
        chain_id: u64,
    },

    /// Free funds were requested on a network that does not allow them.
    #[error("faucet is not available on {network}")]
    FaucetUnavailable {
        /// Network the client is connected to.
        network: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Ledger storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Error from a token collaborator outside settlement.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<mart_persist::PersistError> for MarketError {
    fn from(e: mart_persist::PersistError) -> Self {
        Self::Storage(e.to_string())
    }
}
