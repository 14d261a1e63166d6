//! Error types for registry, coin and amount operations.

use thiserror::Error;

use crate::address::Address;
use crate::registry::AssetId;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur in token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Invalid account address.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// Invalid amount (bad format, overflow or underflow).
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// The asset does not exist in the registry.
    #[error("token {id} does not exist")]
    TokenNotFound {
        /// Asset identifier.
        id: AssetId,
    },

    /// The caller or `from` account does not own the asset.
    #[error("{account} is not the owner of token {id}")]
    NotOwner {
        /// Account that claimed ownership.
        account: Address,
        /// Asset identifier.
        id: AssetId,
    },

    /// The operator is neither owner nor approved for the asset.
    #[error("{operator} is not approved to transfer token {id}")]
    NotAuthorized {
        /// Account attempting the transfer.
        operator: Address,
        /// Asset identifier.
        id: AssetId,
    },

    /// Enumeration index past the owner's balance.
    #[error("index {index} out of bounds for {owner} (balance {balance})")]
    IndexOutOfBounds {
        /// Owner being enumerated.
        owner: Address,
        /// Requested index.
        index: u64,
        /// Owner's balance.
        balance: u64,
    },

    /// Not enough native currency for a transfer.
    #[error("insufficient balance: {account} has {have}, needs {need}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Current balance.
        have: String,
        /// Required balance.
        need: String,
    },

    /// Snapshot persistence failed.
    #[error(transparent)]
    Persist(#[from] mart_persist::PersistError),
}

impl TokenError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }
}
