//! The settlement engine.
//!
//! [`Marketplace`] owns the order ledger and the custody adapter and drives
//! every state change: posting, cancelling and buying. Each operation either
//! applies completely or fails leaving ledger, custody and balances as they
//! were.
//!
//! # Buy sequence
//!
//! 1. the order must be `Open` and the buyer must not be the escrow account
//! 2. the required amount is resolved from the order price and the reading
//! 3. the payment must cover it
//! 4. the seller must be able to receive the payout
//! 5. the order is staged as `Filled` before any external call, so a
//!    re-entrant `buy` or `cancel` sees a closed order
//! 6. the payment is collected into the marketplace account
//! 7. the asset is released to the buyer; on failure the payment is returned
//!    and the order reopens
//! 8. the seller is paid and any excess refunded per [`RefundPolicy`]
//! 9. the transition is committed

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mart_token::{Address, AssetId, PaymentRail, RegistryId, Wei};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::custody::CustodyAdapter;
use crate::error::{MarketError, Result};
use crate::ledger::OrderLedger;
use crate::oracle::OracleReading;
use crate::order::{Order, OrderId, OrderStatus, Price};
use crate::pricing::PriceResolver;

/// What happens to a payment above the required amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    /// Seller receives the required amount; the excess goes back to the buyer.
    #[default]
    RefundExcess,
    /// Seller receives the whole payment.
    ForwardFull,
}

impl fmt::Display for RefundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefundExcess => write!(f, "refund_excess"),
            Self::ForwardFull => write!(f, "forward_full"),
        }
    }
}

impl FromStr for RefundPolicy {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "refund_excess" => Ok(Self::RefundExcess),
            "forward_full" => Ok(Self::ForwardFull),
            _ => Err(MarketError::Config(format!(
                "unknown refund policy {s:?}, expected refund_excess or forward_full"
            ))),
        }
    }
}

/// Outcome of a successful buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// The filled order.
    pub order_id: OrderId,
    /// Registry of the sold asset.
    pub registry: RegistryId,
    /// The sold asset.
    pub asset_id: AssetId,
    /// New owner of the asset.
    pub buyer: Address,
    /// Previous owner, who was paid.
    pub seller: Address,
    /// Amount resolved from the order price.
    pub required: Wei,
    /// Amount the buyer paid in.
    pub paid: Wei,
    /// Amount the seller received.
    pub forwarded: Wei,
    /// Amount returned to the buyer.
    pub refunded: Wei,
    /// When the order was filled.
    pub settled_at: DateTime<Utc>,
}

/// Escrowing marketplace for assets priced in USD or native currency.
pub struct Marketplace {
    ledger: OrderLedger,
    custody: CustodyAdapter,
    rail: Arc<dyn PaymentRail>,
    resolver: PriceResolver,
    refund_policy: RefundPolicy,
}

impl Marketplace {
    /// Create a marketplace with the default resolver (`ETH/USD`, any age)
    /// and refund policy.
    pub fn new(ledger: OrderLedger, custody: CustodyAdapter, rail: Arc<dyn PaymentRail>) -> Self {
        Self {
            ledger,
            custody,
            rail,
            resolver: PriceResolver::default(),
            refund_policy: RefundPolicy::default(),
        }
    }

    /// Use `resolver` to validate readings.
    #[must_use]
    pub fn with_resolver(mut self, resolver: PriceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use `policy` for over-payments.
    #[must_use]
    pub fn with_refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }

    /// The marketplace's own account, which holds escrowed assets.
    pub fn address(&self) -> &Address {
        self.custody.custodian()
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// The configured price resolver.
    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// The configured refund policy.
    pub fn refund_policy(&self) -> RefundPolicy {
        self.refund_policy
    }

    /// Look up an order.
    pub fn order(&self, order_id: OrderId) -> Result<&Order> {
        self.ledger.get(order_id)
    }

    /// Every order ever posted, in id order. Callers filter by status.
    pub fn get_all_orders(&self) -> &[Order] {
        self.ledger.orders()
    }

    /// List `asset_id` for sale at `price`, escrowing it.
    ///
    /// The seller must have approved [`Marketplace::address`] on the asset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrice` for a zero price, `EscrowAccount` if the seller
    /// is the marketplace itself, `UnknownRegistry`,
    /// `AlreadyListed` if an open order holds the asset, and `NotApproved` or
    /// `CustodyTakeFailed` if escrow fails. No order is recorded on error.
    pub fn post_sell_order(
        &mut self,
        seller: &Address,
        registry: &RegistryId,
        asset_id: AssetId,
        price: Price,
    ) -> Result<OrderId> {
        if price.is_zero() {
            return Err(MarketError::InvalidPrice("price must be greater than zero".into()));
        }
        self.ensure_not_escrow(seller)?;
        self.custody.registry(registry)?;
        if let Some(open) = self.ledger.open_order_for(registry, asset_id) {
            warn!(registry = %registry, asset = %asset_id, order_id = %open.id(), "asset already listed");
            return Err(MarketError::AlreadyListed {
                registry: registry.clone(),
                asset_id,
                order_id: open.id(),
            });
        }

        self.custody.take(registry, asset_id, seller)?;
        let order_id = self
            .ledger
            .insert(registry.clone(), asset_id, seller.clone(), price);

        info!(
            order_id = %order_id,
            registry = %registry,
            asset = %asset_id,
            seller = %seller,
            price = %price,
            "sell order posted"
        );
        Ok(order_id)
    }

    /// Withdraw an open order, returning the asset to its creator.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `Unauthorized` if `requester` is not the
    /// creator, `OrderNotOpen`, or `CustodyReleaseFailed` (the order stays
    /// open).
    pub fn cancel_order(&mut self, order_id: OrderId, requester: &Address) -> Result<()> {
        let order = self.ledger.get(order_id)?;
        if order.creator() != requester {
            warn!(order_id = %order_id, requester = %requester, "cancel refused: not the creator");
            return Err(MarketError::Unauthorized {
                order_id,
                requester: requester.clone(),
            });
        }
        let registry = order.registry().clone();
        let asset_id = order.asset_id();
        let creator = order.creator().clone();

        let pending = self
            .ledger
            .begin_close(order_id, OrderStatus::Cancelled, None)?;
        self.custody.release(&registry, asset_id, &creator)?;
        pending.commit();

        info!(order_id = %order_id, registry = %registry, asset = %asset_id, "order cancelled");
        Ok(())
    }

    /// Native amount currently required to buy an order.
    ///
    /// Read-only; works for orders in any status.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `StaleOrMissingReading` or `AmountOverflow`.
    pub fn get_price(&self, order_id: OrderId, reading: Option<&OracleReading>) -> Result<Wei> {
        let order = self.ledger.get(order_id)?;
        self.resolver.resolve(order.price(), reading)
    }

    /// Buy an open order, paying `payment` from `buyer`'s balance.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `OrderNotOpen`, `EscrowAccount` if the buyer is
    /// the marketplace itself, `StaleOrMissingReading`, `InsufficientPayment`,
    /// `Payment` if the buyer cannot fund the payment or the seller cannot
    /// receive the payout,
    /// or `CustodyReleaseFailed`. On error the order stays open, the asset
    /// stays escrowed and no balance changes.
    pub fn buy(
        &mut self,
        order_id: OrderId,
        buyer: &Address,
        payment: Wei,
        reading: Option<&OracleReading>,
    ) -> Result<SettlementReceipt> {
        let order = self.ledger.get(order_id)?;
        if !order.is_open() {
            warn!(order_id = %order_id, status = %order.status(), "buy refused: order not open");
            return Err(MarketError::OrderNotOpen {
                order_id,
                status: order.status(),
            });
        }
        self.ensure_not_escrow(buyer)?;

        let required = self.resolver.resolve(order.price(), reading)?;
        if payment < required {
            warn!(order_id = %order_id, required = %required, offered = %payment, "buy refused: insufficient payment");
            return Err(MarketError::InsufficientPayment {
                required,
                offered: payment,
            });
        }

        let registry = order.registry().clone();
        let asset_id = order.asset_id();
        let seller = order.creator().clone();
        let escrow = self.custody.custodian().clone();
        let (forwarded, refunded) = match self.refund_policy {
            RefundPolicy::RefundExcess => (required, payment.saturating_sub(required)),
            RefundPolicy::ForwardFull => (payment, Wei::ZERO),
        };
        // The buyer is debited the whole payment first, so only the seller's
        // credit can fail.
        if seller != *buyer {
            self.rail.ensure_can_credit(&seller, forwarded).map_err(|e| {
                warn!(order_id = %order_id, seller = %seller, error = %e, "buy refused: seller cannot be paid");
                MarketError::Payment(e.to_string())
            })?;
        }

        let pending = self
            .ledger
            .begin_close(order_id, OrderStatus::Filled, Some(buyer.clone()))?;

        self.rail
            .transfer(buyer, &escrow, payment)
            .map_err(|e| MarketError::Payment(e.to_string()))?;

        if let Err(e) = self.custody.release(&registry, asset_id, buyer) {
            return_funds(self.rail.as_ref(), &escrow, buyer, payment, order_id);
            return Err(e);
        }

        if let Err(e) = pay_out(self.rail.as_ref(), &escrow, &seller, forwarded, buyer, refunded) {
            // Only a concurrent change to the rail gets here. The buyer already
            // owns the asset, so the fill stands.
            error!(
                order_id = %order_id,
                seller = %seller,
                forwarded = %forwarded,
                refunded = %refunded,
                error = %e,
                "payout failed after asset release; funds remain in escrow"
            );
            pending.commit();
            return Err(e);
        }

        let filled = pending.commit();
        let settled_at = filled.closed_at().unwrap_or_else(Utc::now);

        info!(
            order_id = %order_id,
            registry = %registry,
            asset = %asset_id,
            buyer = %buyer,
            seller = %seller,
            required = %required,
            paid = %payment,
            refunded = %refunded,
            "order filled"
        );

        Ok(SettlementReceipt {
            order_id,
            registry,
            asset_id,
            buyer: buyer.clone(),
            seller,
            required,
            paid: payment,
            forwarded,
            refunded,
            settled_at,
        })
    }

    fn ensure_not_escrow(&self, account: &Address) -> Result<()> {
        if account == self.custody.custodian() {
            warn!(account = %account, "refused: escrow account cannot trade");
            return Err(MarketError::EscrowAccount {
                account: account.clone(),
            });
        }
        Ok(())
    }
}

fn pay_out(
    rail: &dyn PaymentRail,
    escrow: &Address,
    seller: &Address,
    forwarded: Wei,
    buyer: &Address,
    refunded: Wei,
) -> Result<()> {
    rail.transfer(escrow, seller, forwarded)
        .map_err(|e| MarketError::Payment(e.to_string()))?;
    if !refunded.is_zero() {
        rail.transfer(escrow, buyer, refunded)
            .map_err(|e| MarketError::Payment(e.to_string()))?;
    }
    Ok(())
}

fn return_funds(rail: &dyn PaymentRail, escrow: &Address, buyer: &Address, amount: Wei, order_id: OrderId) {
    if let Err(e) = rail.transfer(escrow, buyer, amount) {
        error!(
            order_id = %order_id,
            buyer = %buyer,
            amount = %amount,
            error = %e,
            "failed to return payment after aborted settlement"
        );
    }
}

impl fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marketplace")
            .field("address", self.address())
            .field("orders", &self.ledger.len())
            .field("resolver", &self.resolver)
            .field("refund_policy", &self.refund_policy)
            .finish_non_exhaustive()
    }
}
