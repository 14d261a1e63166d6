//! The order ledger.
//!
//! An append-only arena of [`Order`] records indexed by [`OrderId`]. Orders
//! are never removed; the only mutation after insertion is the single
//! `Open -> Filled | Cancelled` transition, made through a [`PendingClose`]
//! guard so that a settlement failing after the transition was staged puts
//! the order back exactly as it was.
//!
//! A persistent ledger snapshots the whole arena to `orders.json` after every
//! insertion and committed transition.

use std::path::Path;

use chrono::Utc;
use mart_persist::JsonStore;
use mart_token::{Address, AssetId, RegistryId};
use tracing::{debug, warn};

use crate::error::{MarketError, Result};
use crate::order::{Order, OrderId, OrderStatus, Price};

/// Authoritative table of every order ever posted.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
    store: Option<JsonStore>,
}

impl OrderLedger {
    /// Create an empty ledger that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the ledger persisted under `state_dir`, reloading its history.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a snapshot exists but is unreadable or its ids do
    /// not match their positions.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let store = JsonStore::new(state_dir, "orders");
        let orders: Vec<Order> = store.try_load()?.unwrap_or_default();

        if let Some((index, order)) = orders
            .iter()
            .enumerate()
            .find(|(i, o)| o.id.index() != *i)
        {
            return Err(MarketError::Storage(format!(
                "order ledger at {} is corrupt: order {} stored at position {index}",
                store.path().display(),
                order.id
            )));
        }

        debug!(orders = orders.len(), path = %store.path().display(), "loaded order ledger");
        Ok(Self {
            orders,
            store: Some(store),
        })
    }

    /// Number of orders ever posted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether no order was ever posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Look up an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` for an id that was never assigned.
    pub fn get(&self, id: OrderId) -> Result<&Order> {
        self.orders
            .get(id.index())
            .ok_or(MarketError::OrderNotFound(id))
    }

    /// Every order, in id order, regardless of status.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The open order currently holding an asset, if any.
    #[must_use]
    pub fn open_order_for(&self, registry: &RegistryId, asset_id: AssetId) -> Option<&Order> {
        self.orders
            .iter()
            .find(|o| o.is_open() && o.asset_id == asset_id && &o.registry == registry)
    }

    /// Append a new open order. Callers must already hold the asset.
    pub(crate) fn insert(
        &mut self,
        registry: RegistryId,
        asset_id: AssetId,
        creator: Address,
        price: Price,
    ) -> OrderId {
        let id = OrderId::new(self.orders.len() as u64);
        self.orders.push(Order {
            id,
            registry,
            asset_id,
            creator,
            price,
            status: OrderStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            buyer: None,
        });
        self.snapshot();
        id
    }

    /// Stage the transition of an open order to `status`.
    ///
    /// The order reads as `status` from the moment this returns. Dropping the
    /// guard without [`PendingClose::commit`] restores it to `Open`.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` for an unknown id and `OrderNotOpen` if the
    /// order cannot move to `status`.
    pub(crate) fn begin_close(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        buyer: Option<Address>,
    ) -> Result<PendingClose<'_>> {
        let index = id.index();
        let order = self
            .orders
            .get_mut(index)
            .ok_or(MarketError::OrderNotFound(id))?;

        if !order.status.can_transition_to(&status) {
            return Err(MarketError::OrderNotOpen {
                order_id: id,
                status: order.status,
            });
        }

        order.status = status;
        order.closed_at = Some(Utc::now());
        order.buyer = buyer;

        Ok(PendingClose {
            ledger: self,
            index,
            committed: false,
        })
    }

    fn snapshot(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.orders) {
                warn!(error = %e, "failed to snapshot order ledger");
            }
        }
    }
}

/// A staged order transition.
///
/// Holds the ledger exclusively until committed or dropped, so nothing else
/// can observe or act on the order while settlement calls out to the
/// registry and payment rail.
#[must_use = "dropping a PendingClose reopens the order"]
pub struct PendingClose<'a> {
    ledger: &'a mut OrderLedger,
    index: usize,
    committed: bool,
}

impl PendingClose<'_> {
    /// The order as it will be once committed.
    pub fn order(&self) -> &Order {
        &self.ledger.orders[self.index]
    }

    /// Make the transition permanent and persist the ledger.
    pub fn commit(mut self) -> Order {
        self.committed = true;
        self.ledger.snapshot();
        self.ledger.orders[self.index].clone()
    }
}

impl Drop for PendingClose<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let order = &mut self.ledger.orders[self.index];
        debug!(order_id = %order.id, staged = %order.status, "rolling back order transition");
        order.status = OrderStatus::Open;
        order.closed_at = None;
        order.buyer = None;
    }
}
