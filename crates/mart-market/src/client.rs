//! Client orchestration façade.
//!
//! [`MarketClient`] wires a [`Marketplace`] to its collaborators and exposes
//! the wallet-level operations: it approves before posting, quotes with the
//! freshest feed reading, and pays a quote plus a safety buffer when buying.

use std::fmt;
use std::sync::Arc;

use mart_token::{Address, AssetId, AssetRegistry, CoinLedger, NftRegistry, PaymentRail, Wei};
use tracing::{debug, info};

use crate::config::{MarketConfig, Network};
use crate::custody::CustodyAdapter;
use crate::error::{MarketError, Result};
use crate::ledger::OrderLedger;
use crate::oracle::{OracleReading, PriceFeed};
use crate::order::{Order, OrderId, Price};
use crate::settlement::{Marketplace, SettlementReceipt};

/// Consumer-facing entry point to the marketplace.
pub struct MarketClient {
    market: Marketplace,
    nft: Arc<NftRegistry>,
    coins: Arc<CoinLedger>,
    feed: Box<dyn PriceFeed>,
    network: Network,
    buffer_bps: u32,
}

impl MarketClient {
    /// Connect using `config`, opening persisted state if a state directory
    /// is configured.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` for an unknown chain id, `Config` for an
    /// invalid configuration and `Storage`/`Token` if state cannot be loaded.
    pub fn connect(config: &MarketConfig, feed: Box<dyn PriceFeed>) -> Result<Self> {
        let network = config.network()?;
        config.validate()?;

        let registry_id = config.registry_id();
        let (nft, coins, ledger) = match &config.state_dir {
            Some(dir) => (
                NftRegistry::open(registry_id, dir)?,
                CoinLedger::open(dir)?,
                OrderLedger::open(dir)?,
            ),
            None => (
                NftRegistry::new(registry_id),
                CoinLedger::new(),
                OrderLedger::in_memory(),
            ),
        };
        let nft = Arc::new(nft);
        let coins = Arc::new(coins);

        let custody = CustodyAdapter::new(config.market_address()?).with_registry(nft.clone());
        let market = Marketplace::new(ledger, custody, coins.clone())
            .with_resolver(config.resolver())
            .with_refund_policy(config.settlement.refund_policy);

        info!(
            network = %network,
            chain_id = network.chain_id(),
            market = %market.address(),
            orders = market.ledger().len(),
            refund_policy = %market.refund_policy(),
            "connected to marketplace"
        );

        Ok(Self {
            market,
            nft,
            coins,
            feed,
            network,
            buffer_bps: config.settlement.buy_buffer_bps,
        })
    }

    /// Network the client is connected to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The underlying marketplace.
    pub fn marketplace(&self) -> &Marketplace {
        &self.market
    }

    /// The asset registry.
    pub fn registry(&self) -> &NftRegistry {
        &self.nft
    }

    /// The native currency ledger.
    pub fn coins(&self) -> &CoinLedger {
        &self.coins
    }

    /// Mint a fresh asset to `to`.
    pub fn mint(&self, to: &Address) -> AssetId {
        self.nft.mint(to)
    }

    /// Assets owned by `owner`, enumerated through the registry's index.
    ///
    /// Escrowed assets belong to the marketplace and are not listed.
    pub fn owned_assets(&self, owner: &Address) -> Result<Vec<AssetId>> {
        let count = self.nft.balance_of(owner);
        let mut assets = Vec::with_capacity(count as usize);
        for index in 0..count {
            assets.push(self.nft.token_of_owner_by_index(owner, index)?);
        }
        Ok(assets)
    }

    /// Native balance of `account`.
    pub fn balance(&self, account: &Address) -> Wei {
        self.coins.balance_of(account)
    }

    /// Credit free funds on a local network.
    ///
    /// # Errors
    ///
    /// Returns `FaucetUnavailable` on any other network.
    pub fn faucet(&self, to: &Address, amount: Wei) -> Result<Wei> {
        if !self.network.allows_faucet() {
            return Err(MarketError::FaucetUnavailable {
                network: self.network.to_string(),
            });
        }
        Ok(self.coins.faucet(to, amount)?)
    }

    /// Approve the marketplace on `asset_id` and list it at `price`.
    pub fn post_order(&mut self, seller: &Address, asset_id: AssetId, price: Price) -> Result<OrderId> {
        self.nft.approve(seller, self.market.address(), asset_id)?;
        self.market
            .post_sell_order(seller, self.nft.id(), asset_id, price)
    }

    /// Cancel an order on behalf of `requester`.
    pub fn cancel_order(&mut self, order_id: OrderId, requester: &Address) -> Result<()> {
        self.market.cancel_order(order_id, requester)
    }

    /// Freshest reading for the marketplace's pair, if the feed has one.
    pub fn reading(&self) -> Option<OracleReading> {
        self.feed.latest(self.market.resolver().pair())
    }

    /// Current native price of an order.
    pub fn quote(&self, order_id: OrderId) -> Result<Wei> {
        let reading = self.reading();
        self.market.get_price(order_id, reading.as_ref())
    }

    /// Buy an order, paying the current quote plus the configured buffer.
    ///
    /// The quote and the settlement use the same reading.
    pub fn buy(&mut self, order_id: OrderId, buyer: &Address) -> Result<SettlementReceipt> {
        let reading = self.reading();
        let quote = self.market.get_price(order_id, reading.as_ref())?;
        let payment = quote
            .with_buffer_bps(self.buffer_bps)
            .ok_or(MarketError::AmountOverflow("applying buy buffer"))?;

        debug!(order_id = %order_id, quote = %quote, payment = %payment, buffer_bps = self.buffer_bps, "buying");
        self.market.buy(order_id, buyer, payment, reading.as_ref())
    }

    /// Buy an order paying exactly `payment`.
    pub fn buy_with_payment(
        &mut self,
        order_id: OrderId,
        buyer: &Address,
        payment: Wei,
    ) -> Result<SettlementReceipt> {
        let reading = self.reading();
        self.market.buy(order_id, buyer, payment, reading.as_ref())
    }

    /// Orders still open for buying.
    pub fn open_orders(&self) -> Vec<&Order> {
        self.market
            .get_all_orders()
            .iter()
            .filter(|o| o.is_open())
            .collect()
    }

    /// Every order ever posted.
    pub fn all_orders(&self) -> &[Order] {
        self.market.get_all_orders()
    }
}

impl fmt::Debug for MarketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketClient")
            .field("network", &self.network)
            .field("market", &self.market)
            .field("buffer_bps", &self.buffer_bps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{AssetPair, StaticPriceFeed};
    use crate::config::SettlementConfig;
    use crate::order::OrderStatus;
    use crate::settlement::RefundPolicy;
    use mart_token::UsdAmount;

    fn addr(s: &str) -> Address {
        Address::new(s).expect("address")
    }

    fn feed(usd_per_eth: u64) -> Box<dyn PriceFeed> {
        Box::new(
            StaticPriceFeed::new()
                .with_usd_price(AssetPair::eth_usd(), UsdAmount::from_dollars(usd_per_eth))
                .expect("feed"),
        )
    }

    fn client() -> MarketClient {
        MarketClient::connect(&MarketConfig::default(), feed(100)).expect("connect")
    }

    #[test]
    fn rejects_unsupported_network() {
        let config = MarketConfig {
            chain_id: 1,
            ..MarketConfig::default()
        };
        let err = MarketClient::connect(&config, feed(100)).unwrap_err();
        assert!(matches!(err, MarketError::UnsupportedNetwork { chain_id: 1 }));
    }

    #[test]
    fn connect_applies_refund_policy() {
        assert_eq!(client().marketplace().refund_policy(), RefundPolicy::RefundExcess);

        let config = MarketConfig {
            settlement: SettlementConfig {
                refund_policy: RefundPolicy::ForwardFull,
                ..SettlementConfig::default()
            },
            ..MarketConfig::default()
        };
        let client = MarketClient::connect(&config, feed(100)).expect("connect");
        assert_eq!(client.marketplace().refund_policy(), RefundPolicy::ForwardFull);
    }

    #[test]
    fn faucet_only_on_local() {
        let local = client();
        local.faucet(&addr("alice"), Wei::from_ether(1)).expect("faucet");
        assert_eq!(local.balance(&addr("alice")), Wei::from_ether(1));

        let config = MarketConfig {
            chain_id: 42,
            ..MarketConfig::default()
        };
        let kovan = MarketClient::connect(&config, feed(100)).expect("connect");
        let err = kovan.faucet(&addr("alice"), Wei::from_ether(1)).unwrap_err();
        assert!(matches!(err, MarketError::FaucetUnavailable { .. }));
    }

    #[test]
    fn post_approves_and_escrows() {
        let mut client = client();
        let seller = addr("seller");
        let token = client.mint(&seller);
        assert_eq!(client.owned_assets(&seller).expect("owned"), vec![token]);

        let id = client
            .post_order(&seller, token, Price::Usd(UsdAmount::from_dollars(100)))
            .expect("post");
        assert!(client.owned_assets(&seller).expect("owned").is_empty());
        assert_eq!(client.open_orders().len(), 1);
        assert_eq!(client.open_orders()[0].id(), id);
    }

    #[test]
    fn buy_pays_quote_plus_buffer() {
        let mut client = client();
        let (seller, buyer) = (addr("seller"), addr("buyer"));
        client.faucet(&buyer, Wei::from_ether(5)).expect("faucet");
        let token = client.mint(&seller);
        let id = client
            .post_order(&seller, token, Price::Usd(UsdAmount::from_dollars(100)))
            .expect("post");

        // ETH at 100 USD: 100 USD is 1 ETH.
        assert_eq!(client.quote(id).expect("quote"), Wei::from_ether(1));

        let receipt = client.buy(id, &buyer).expect("buy");
        assert_eq!(receipt.paid, "1.01".parse().expect("wei"));
        assert_eq!(receipt.refunded, "0.01".parse().expect("wei"));
        assert_eq!(client.balance(&buyer), Wei::from_ether(4));
        assert_eq!(client.balance(&seller), Wei::from_ether(1));
        assert_eq!(client.owned_assets(&buyer).expect("owned"), vec![token]);
        assert!(client.open_orders().is_empty());
        assert_eq!(client.all_orders()[0].status(), OrderStatus::Filled);
    }

    #[test]
    fn buy_without_feed_reading_fails() {
        let mut client =
            MarketClient::connect(&MarketConfig::default(), Box::new(StaticPriceFeed::new()))
                .expect("connect");
        let (seller, buyer) = (addr("seller"), addr("buyer"));
        client.faucet(&buyer, Wei::from_ether(5)).expect("faucet");
        let token = client.mint(&seller);
        let id = client
            .post_order(&seller, token, Price::Usd(UsdAmount::from_dollars(100)))
            .expect("post");

        let err = client.buy(id, &buyer).unwrap_err();
        assert!(matches!(err, MarketError::StaleOrMissingReading(_)));
        assert!(client.open_orders()[0].is_open());
    }

    #[test]
    fn post_someone_elses_asset_fails() {
        let mut client = client();
        let token = client.mint(&addr("alice"));
        let err = client
            .post_order(&addr("mallory"), token, Price::Native(Wei::from_ether(1)))
            .unwrap_err();
        assert!(matches!(err, MarketError::Token(_)));
        assert!(client.all_orders().is_empty());
    }

    #[test]
    fn state_survives_reconnect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MarketConfig {
            state_dir: Some(dir.path().to_path_buf()),
            ..MarketConfig::default()
        };
        let seller = addr("seller");
        let id = {
            let mut client = MarketClient::connect(&config, feed(100)).expect("connect");
            let token = client.mint(&seller);
            client
                .post_order(&seller, token, Price::Native(Wei::from_ether(1)))
                .expect("post")
        };

        let mut client = MarketClient::connect(&config, feed(100)).expect("reconnect");
        assert_eq!(client.open_orders().len(), 1);
        client.cancel_order(id, &seller).expect("cancel");
        assert_eq!(client.owned_assets(&seller).expect("owned").len(), 1);
    }
}
