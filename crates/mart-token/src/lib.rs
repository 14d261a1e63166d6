//! # mart-token
//!
//! Value primitives and the external collaborators of the stablemart
//! marketplace.
//!
//! This crate provides:
//! - [`Wei`] and [`UsdAmount`]: 18-decimal fixed-point amounts, and the [`Rate`] between them
//! - [`Address`]: account identities
//! - [`NftRegistry`]: ERC-721-style asset ownership registry
//! - [`CoinLedger`]: native currency balances
//!
//! The marketplace consumes the registry and the ledger only through the
//! [`AssetRegistry`] and [`PaymentRail`] traits.
//!
//! ## Example
//!
//! ```rust
//! use mart_token::{Address, AssetRegistry, NftRegistry, RegistryId};
//!
//! # fn example() -> mart_token::Result<()> {
//! let nft = NftRegistry::new(RegistryId::new("nft"));
//! let alice = Address::new("alice")?;
//! let token = nft.mint(&alice);
//! assert_eq!(nft.owner_of(token)?, alice);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod coin;
pub mod error;
pub mod registry;

pub use address::Address;
pub use amount::{Rate, UsdAmount, Wei};
pub use coin::{CoinLedger, PaymentRail};
pub use error::{Result, TokenError};
pub use registry::{AssetId, AssetRegistry, NftRegistry, RegistryId};
