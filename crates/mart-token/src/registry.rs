//! Non-fungible asset registry.
//!
//! An in-process, ERC-721-style ownership registry: assets are minted with
//! sequential ids starting at 1, each asset has exactly one owner and at most
//! one approved spender, and a transfer clears the approval.
//!
//! The marketplace only depends on the [`AssetRegistry`] capability trait;
//! [`NftRegistry`] is the concrete registry used by the CLI and tests.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use mart_persist::JsonStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::error::{Result, TokenError};

/// Identifier of one asset within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Create an asset id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a registry instance (the contract address in the reference
/// deployment).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(String);

impl RegistryId {
    /// Create a registry id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership capability consumed by the marketplace's custody adapter.
///
/// Implementations must apply `transfer_from` atomically: on error the
/// asset's ownership and approval are unchanged.
pub trait AssetRegistry: Send + Sync {
    /// Identifier of this registry.
    fn id(&self) -> &RegistryId;

    /// Current owner of an asset.
    fn owner_of(&self, id: AssetId) -> Result<Address>;

    /// Approved spender of an asset, if any.
    fn get_approved(&self, id: AssetId) -> Result<Option<Address>>;

    /// Move an asset from `from` to `to` on behalf of `operator`.
    fn transfer_from(&self, operator: &Address, from: &Address, to: &Address, id: AssetId) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    owner: Address,
    approved: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryState {
    next_id: u64,
    tokens: BTreeMap<AssetId, TokenRecord>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            next_id: 1,
            tokens: BTreeMap::new(),
        }
    }
}

impl RegistryState {
    fn token(&self, id: AssetId) -> Result<&TokenRecord> {
        self.tokens.get(&id).ok_or(TokenError::TokenNotFound { id })
    }

    fn owned_by<'a>(&'a self, owner: &'a Address) -> impl Iterator<Item = AssetId> + 'a {
        self.tokens
            .iter()
            .filter(move |(_, t)| &t.owner == owner)
            .map(|(id, _)| *id)
    }
}

/// ERC-721-style registry with optional JSON snapshot persistence.
pub struct NftRegistry {
    id: RegistryId,
    state: Mutex<RegistryState>,
    store: Option<JsonStore>,
}

impl NftRegistry {
    /// Create an empty in-memory registry.
    #[must_use]
    pub fn new(id: RegistryId) -> Self {
        Self {
            id,
            state: Mutex::new(RegistryState::default()),
            store: None,
        }
    }

    /// Open a persisted registry under `state_dir`, loading any existing
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if a snapshot exists but cannot be read.
    pub fn open(id: RegistryId, state_dir: &Path) -> Result<Self> {
        let store = JsonStore::new(state_dir, &format!("registry-{id}"));
        let state: RegistryState = store.try_load()?.unwrap_or_default();
        debug!(registry = %id, tokens = state.tokens.len(), "loaded registry from disk");
        Ok(Self {
            id,
            state: Mutex::new(state),
            store: Some(store),
        })
    }

    /// Mint a new asset to `to`, returning its id.
    pub fn mint(&self, to: &Address) -> AssetId {
        let mut state = self.state.lock();
        let id = AssetId(state.next_id);
        state.next_id += 1;
        state.tokens.insert(
            id,
            TokenRecord {
                owner: to.clone(),
                approved: None,
            },
        );
        self.snapshot(&state);

        info!(registry = %self.id, token = %id, owner = %to, "minted");
        id
    }

    /// Number of assets owned by `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.state.lock().owned_by(owner).count() as u64
    }

    /// The `index`-th asset owned by `owner`, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns error if `index` is not below the owner's balance.
    pub fn token_of_owner_by_index(&self, owner: &Address, index: u64) -> Result<AssetId> {
        let state = self.state.lock();
        let owned: Vec<AssetId> = state.owned_by(owner).collect();
        owned
            .get(index as usize)
            .copied()
            .ok_or_else(|| TokenError::IndexOutOfBounds {
                owner: owner.clone(),
                index,
                balance: owned.len() as u64,
            })
    }

    /// All assets owned by `owner`, in ascending id order.
    pub fn tokens_of(&self, owner: &Address) -> Vec<AssetId> {
        self.state.lock().owned_by(owner).collect()
    }

    /// Approve `spender` to transfer asset `id`. Only the owner may approve.
    ///
    /// # Errors
    ///
    /// Returns error if the asset does not exist or `caller` does not own it.
    pub fn approve(&self, caller: &Address, spender: &Address, id: AssetId) -> Result<()> {
        let mut state = self.state.lock();
        let token = state
            .tokens
            .get_mut(&id)
            .ok_or(TokenError::TokenNotFound { id })?;
        if &token.owner != caller {
            return Err(TokenError::NotOwner {
                account: caller.clone(),
                id,
            });
        }
        token.approved = Some(spender.clone());
        self.snapshot(&state);

        debug!(registry = %self.id, token = %id, spender = %spender, "approved");
        Ok(())
    }

    fn snapshot(&self, state: &RegistryState) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(state) {
                warn!(registry = %self.id, error = %e, "failed to snapshot registry");
            }
        }
    }
}

impl AssetRegistry for NftRegistry {
    fn id(&self) -> &RegistryId {
        &self.id
    }

    fn owner_of(&self, id: AssetId) -> Result<Address> {
        Ok(self.state.lock().token(id)?.owner.clone())
    }

    fn get_approved(&self, id: AssetId) -> Result<Option<Address>> {
        Ok(self.state.lock().token(id)?.approved.clone())
    }

    fn transfer_from(&self, operator: &Address, from: &Address, to: &Address, id: AssetId) -> Result<()> {
        let mut state = self.state.lock();
        let token = state
            .tokens
            .get_mut(&id)
            .ok_or(TokenError::TokenNotFound { id })?;

        if &token.owner != from {
            return Err(TokenError::NotOwner {
                account: from.clone(),
                id,
            });
        }
        if operator != from && token.approved.as_ref() != Some(operator) {
            return Err(TokenError::NotAuthorized {
                operator: operator.clone(),
                id,
            });
        }

        token.owner = to.clone();
        token.approved = None;
        self.snapshot(&state);

        debug!(registry = %self.id, token = %id, from = %from, to = %to, "transferred");
        Ok(())
    }
}

impl fmt::Debug for NftRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NftRegistry")
            .field("id", &self.id)
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).expect("address")
    }

    fn registry() -> NftRegistry {
        NftRegistry::new(RegistryId::new("nft"))
    }

    #[test]
    fn mint_assigns_sequential_ids_from_one() {
        let nft = registry();
        let owner = addr("alice");
        assert_eq!(nft.mint(&owner), AssetId::new(1));
        assert_eq!(nft.mint(&owner), AssetId::new(2));
        assert_eq!(nft.owner_of(AssetId::new(1)).expect("owner"), owner);
        assert_eq!(nft.balance_of(&owner), 2);
    }

    #[test]
    fn owner_of_unknown_token_fails() {
        let nft = registry();
        assert!(matches!(
            nft.owner_of(AssetId::new(9)),
            Err(TokenError::TokenNotFound { .. })
        ));
    }

    #[test]
    fn approved_spender_can_transfer() {
        let nft = registry();
        let (alice, bob) = (addr("alice"), addr("bob"));
        let id = nft.mint(&alice);

        nft.approve(&alice, &bob, id).expect("approve");
        assert_eq!(nft.get_approved(id).expect("approved"), Some(bob.clone()));

        nft.transfer_from(&bob, &alice, &bob, id).expect("transfer");
        assert_eq!(nft.owner_of(id).expect("owner"), bob);
        // approval is cleared by the transfer
        assert_eq!(nft.get_approved(id).expect("approved"), None);
    }

    #[test]
    fn unapproved_operator_cannot_transfer() {
        let nft = registry();
        let (alice, mallory) = (addr("alice"), addr("mallory"));
        let id = nft.mint(&alice);

        let result = nft.transfer_from(&mallory, &alice, &mallory, id);
        assert!(matches!(result, Err(TokenError::NotAuthorized { .. })));
        assert_eq!(nft.owner_of(id).expect("owner"), alice);
    }

    #[test]
    fn transfer_from_wrong_owner_fails() {
        let nft = registry();
        let (alice, bob) = (addr("alice"), addr("bob"));
        let id = nft.mint(&alice);

        let result = nft.transfer_from(&bob, &bob, &alice, id);
        assert!(matches!(result, Err(TokenError::NotOwner { .. })));
    }

    #[test]
    fn only_owner_can_approve() {
        let nft = registry();
        let (alice, bob) = (addr("alice"), addr("bob"));
        let id = nft.mint(&alice);
        assert!(matches!(
            nft.approve(&bob, &bob, id),
            Err(TokenError::NotOwner { .. })
        ));
    }

    #[test]
    fn enumerates_owned_tokens() {
        let nft = registry();
        let (alice, bob) = (addr("alice"), addr("bob"));
        let first = nft.mint(&alice);
        let _ = nft.mint(&bob);
        let third = nft.mint(&alice);

        assert_eq!(nft.token_of_owner_by_index(&alice, 0).expect("index 0"), first);
        assert_eq!(nft.token_of_owner_by_index(&alice, 1).expect("index 1"), third);
        assert!(matches!(
            nft.token_of_owner_by_index(&alice, 2),
            Err(TokenError::IndexOutOfBounds { balance: 2, .. })
        ));
        assert_eq!(nft.tokens_of(&alice), vec![first, third]);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let alice = addr("alice");
        {
            let nft = NftRegistry::open(RegistryId::new("nft"), dir.path()).expect("open");
            nft.mint(&alice);
            nft.mint(&alice);
        }
        let nft = NftRegistry::open(RegistryId::new("nft"), dir.path()).expect("reopen");
        assert_eq!(nft.balance_of(&alice), 2);
        // id sequence continues after reload
        assert_eq!(nft.mint(&alice), AssetId::new(3));
    }
}
