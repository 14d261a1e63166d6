//! Order commands: post, cancel, orders.

use std::io::Write;

use mart_market::{MarketClient, OrderId, Price};
use mart_token::{Address, AssetId, UsdAmount, Wei};

use crate::cli::PostArgs;
use crate::error::CliError;
use crate::output::{Message, OrderInfo, OrderList, OutputFormat, Posted};

/// Order command executor.
pub struct OrdersCommand {
    account: Option<Address>,
}

impl OrdersCommand {
    /// Create a command acting as `account`. Listing needs no account.
    #[must_use]
    pub const fn new(account: Option<Address>) -> Self {
        Self { account }
    }

    fn account(&self) -> Result<&Address, CliError> {
        self.account
            .as_ref()
            .ok_or_else(|| CliError::InvalidArgument("--account is required".into()))
    }

    /// Approve the marketplace and list an asset.
    pub fn post<W: Write>(
        &self,
        client: &mut MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        args: &PostArgs,
    ) -> Result<(), CliError> {
        let seller = self.account()?;
        let price = parse_price(args)?;
        let asset_id = AssetId::new(args.asset_id);
        let order_id = client.post_order(seller, asset_id, price)?;
        format.write(
            writer,
            &Posted {
                order_id: order_id.value(),
                asset_id: args.asset_id,
                price: price.to_string(),
            },
        )
    }

    /// Cancel one of the account's orders.
    pub fn cancel<W: Write>(
        &self,
        client: &mut MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        order_id: u64,
    ) -> Result<(), CliError> {
        let requester = self.account()?;
        client.cancel_order(OrderId::new(order_id), requester)?;
        format.write(writer, &Message::success(format!("Cancelled order {order_id}")))
    }

    /// List open orders, or every order with `all`.
    pub fn list<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        all: bool,
    ) -> Result<(), CliError> {
        let orders = if all {
            client.all_orders().iter().map(OrderInfo::from).collect()
        } else {
            client.open_orders().into_iter().map(OrderInfo::from).collect()
        };
        format.write(writer, &OrderList { orders })
    }
}

fn parse_price(args: &PostArgs) -> Result<Price, CliError> {
    match (&args.usd, &args.eth) {
        (Some(usd), None) => usd
            .parse::<UsdAmount>()
            .map(Price::Usd)
            .map_err(|e| CliError::invalid_amount("--usd", e)),
        (None, Some(eth)) => eth
            .parse::<Wei>()
            .map(Price::Native)
            .map_err(|e| CliError::invalid_amount("--eth", e)),
        _ => Err(CliError::InvalidArgument(
            "exactly one of --usd or --eth is required".into(),
        )),
    }
}
