//! Native currency balances.
//!
//! [`CoinLedger`] tracks wei balances per account. The marketplace moves
//! payments through the [`PaymentRail`] capability only.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use mart_persist::JsonStore;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::amount::Wei;
use crate::error::{Result, TokenError};

/// Payment capability consumed by the settlement engine.
///
/// `transfer` is all-or-nothing: on error no balance has changed.
pub trait PaymentRail: Send + Sync {
    /// Current balance of an account.
    fn balance_of(&self, account: &Address) -> Wei;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<()>;

    /// Check that `to` could be credited `amount`, without moving anything.
    ///
    /// # Errors
    ///
    /// Returns error if the credit would overflow the balance.
    fn ensure_can_credit(&self, to: &Address, amount: Wei) -> Result<()> {
        self.balance_of(to)
            .checked_add(amount)
            .map(|_| ())
            .ok_or_else(|| TokenError::invalid_amount("balance overflow"))
    }
}

/// In-process native currency ledger with optional JSON persistence.
pub struct CoinLedger {
    balances: Mutex<BTreeMap<Address, Wei>>,
    store: Option<JsonStore>,
}

impl CoinLedger {
    /// Create an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(BTreeMap::new()),
            store: None,
        }
    }

    /// Open a persisted ledger under `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a snapshot exists but cannot be read.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let store = JsonStore::new(state_dir, "balances");
        let balances: BTreeMap<Address, Wei> = store.try_load()?.unwrap_or_default();
        debug!(accounts = balances.len(), "loaded balances from disk");
        Ok(Self {
            balances: Mutex::new(balances),
            store: Some(store),
        })
    }

    /// Credit `amount` out of thin air. Callers restrict this to local
    /// networks.
    ///
    /// # Errors
    ///
    /// Returns error if the resulting balance would overflow.
    pub fn faucet(&self, to: &Address, amount: Wei) -> Result<Wei> {
        let mut balances = self.balances.lock();
        let balance = balances.entry(to.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::invalid_amount("balance overflow"))?;
        let new_balance = *balance;
        self.snapshot(&balances);

        info!(account = %to, amount = %amount, "faucet credited");
        Ok(new_balance)
    }

    /// All non-zero balances.
    pub fn balances(&self) -> Vec<(Address, Wei)> {
        self.balances
            .lock()
            .iter()
            .filter(|(_, b)| !b.is_zero())
            .map(|(a, b)| (a.clone(), *b))
            .collect()
    }

    fn snapshot(&self, balances: &BTreeMap<Address, Wei>) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(balances) {
                warn!(error = %e, "failed to snapshot balances");
            }
        }
    }
}

impl Default for CoinLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRail for CoinLedger {
    fn balance_of(&self, account: &Address) -> Wei {
        self.balances.lock().get(account).copied().unwrap_or_default()
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<()> {
        let mut balances = self.balances.lock();

        let have = balances.get(from).copied().unwrap_or_default();
        let remaining = have
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                account: from.clone(),
                have: have.to_string(),
                need: amount.to_string(),
            })?;

        if from != to {
            let credited = balances
                .get(to)
                .copied()
                .unwrap_or_default()
                .checked_add(amount)
                .ok_or_else(|| TokenError::invalid_amount("balance overflow"))?;
            balances.insert(from.clone(), remaining);
            balances.insert(to.clone(), credited);
            self.snapshot(&balances);
        }

        debug!(from = %from, to = %to, amount = %amount, "coin transfer");
        Ok(())
    }
}

impl fmt::Debug for CoinLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinLedger")
            .field("accounts", &self.balances.lock().len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
