//! Asset custody adapter.
//!
//! Escrows one asset per open order by moving it into the marketplace's own
//! account on the external registry, and releases it to the buyer or back to
//! the seller when the order closes. The registry's ownership record is the
//! only guard: taking an asset the marketplace already holds fails because
//! the seller no longer owns it, and releasing an asset the marketplace does
//! not hold fails because the custodian is not its owner.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mart_token::{Address, AssetId, AssetRegistry, RegistryId};
use tracing::{debug, warn};

use crate::error::{MarketError, Result};

/// Holds assets on behalf of sellers while their orders are open.
pub struct CustodyAdapter {
    custodian: Address,
    registries: HashMap<RegistryId, Arc<dyn AssetRegistry>>,
}

impl CustodyAdapter {
    /// Create an adapter acting as `custodian` with no registries.
    #[must_use]
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            registries: HashMap::new(),
        }
    }

    /// Register an asset registry the marketplace accepts listings from.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn AssetRegistry>) -> Self {
        self.add_registry(registry);
        self
    }

    /// Register an asset registry, replacing any previous one with the same id.
    pub fn add_registry(&mut self, registry: Arc<dyn AssetRegistry>) {
        self.registries.insert(registry.id().clone(), registry);
    }

    /// The marketplace's account on every registry.
    #[must_use]
    pub const fn custodian(&self) -> &Address {
        &self.custodian
    }

    /// Look up a registered registry.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRegistry` if it was never registered.
    pub fn registry(&self, id: &RegistryId) -> Result<&Arc<dyn AssetRegistry>> {
        self.registries
            .get(id)
            .ok_or_else(|| MarketError::UnknownRegistry(id.clone()))
    }

    /// Whether the custodian currently owns the asset.
    ///
    /// # Errors
    ///
    /// Returns error if the registry is unknown or the asset does not exist.
    pub fn holds(&self, registry: &RegistryId, asset_id: AssetId) -> Result<bool> {
        let owner = self.registry(registry)?.owner_of(asset_id)?;
        Ok(owner == self.custodian)
    }

    /// Move the asset from `from` into escrow.
    ///
    /// # Errors
    ///
    /// Returns `NotApproved` if the custodian is not the approved spender and
    /// `CustodyTakeFailed` if `from` does not own the asset or the registry
    /// refuses the transfer.
    pub fn take(&self, registry_id: &RegistryId, asset_id: AssetId, from: &Address) -> Result<()> {
        let registry = self.registry(registry_id)?;
        let take_failed = |reason: String| MarketError::CustodyTakeFailed {
            registry: registry_id.clone(),
            asset_id,
            reason,
        };

        let owner = registry
            .owner_of(asset_id)
            .map_err(|e| take_failed(e.to_string()))?;
        if &owner != from {
            warn!(registry = %registry_id, asset = %asset_id, owner = %owner, from = %from, "custody take refused: not owner");
            return Err(take_failed(format!("{from} does not own the asset")));
        }

        let approved = registry
            .get_approved(asset_id)
            .map_err(|e| take_failed(e.to_string()))?;
        if approved.as_ref() != Some(&self.custodian) {
            warn!(registry = %registry_id, asset = %asset_id, from = %from, "custody take refused: not approved");
            return Err(MarketError::NotApproved {
                registry: registry_id.clone(),
                asset_id,
            });
        }

        registry
            .transfer_from(&self.custodian, from, &self.custodian, asset_id)
            .map_err(|e| take_failed(e.to_string()))?;

        debug!(registry = %registry_id, asset = %asset_id, from = %from, "custody taken");
        Ok(())
    }

    /// Move the asset out of escrow to `to`.
    ///
    /// # Errors
    ///
    /// Returns `CustodyReleaseFailed` if the custodian does not hold the asset
    /// or the registry refuses the transfer.
    pub fn release(&self, registry_id: &RegistryId, asset_id: AssetId, to: &Address) -> Result<()> {
        let registry = self.registry(registry_id)?;
        registry
            .transfer_from(&self.custodian, &self.custodian, to, asset_id)
            .map_err(|e| MarketError::CustodyReleaseFailed {
                registry: registry_id.clone(),
                asset_id,
                reason: e.to_string(),
            })?;

        debug!(registry = %registry_id, asset = %asset_id, to = %to, "custody released");
        Ok(())
    }
}

impl fmt::Debug for CustodyAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.registries.keys().map(RegistryId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("CustodyAdapter")
            .field("custodian", &self.custodian)
            .field("registries", &ids)
            .finish()
    }
}
