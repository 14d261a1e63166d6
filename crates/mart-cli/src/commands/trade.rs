//! Trade commands: quote, buy.

use std::io::Write;

use mart_market::{MarketClient, OrderId};
use mart_token::{Address, Wei};

use crate::error::CliError;
use crate::output::{OutputFormat, QuoteView};

/// Trade command executor.
pub struct TradeCommand {
    account: Option<Address>,
}

impl TradeCommand {
    /// Create a command acting as `account`. Quoting needs no account.
    #[must_use]
    pub const fn new(account: Option<Address>) -> Self {
        Self { account }
    }

    /// Show what an order costs right now.
    pub fn quote<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        order_id: u64,
    ) -> Result<(), CliError> {
        let id = OrderId::new(order_id);
        let order = client.marketplace().order(id)?;
        let price = order.price();
        let required = client.quote(id)?;
        let rate = if price.needs_reading() {
            client.reading().map(|r| r.rate.to_string())
        } else {
            None
        };

        format.write(
            writer,
            &QuoteView {
                order_id,
                price: price.to_string(),
                required: required.to_string(),
                rate,
            },
        )
    }

    /// Buy an order, paying the buffered quote or an explicit amount.
    pub fn buy<W: Write>(
        &self,
        client: &mut MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        order_id: u64,
        payment: Option<&str>,
    ) -> Result<(), CliError> {
        let buyer = self
            .account
            .as_ref()
            .ok_or_else(|| CliError::InvalidArgument("--account is required".into()))?;
        let id = OrderId::new(order_id);

        let receipt = match payment {
            Some(raw) => {
                let payment: Wei = raw
                    .parse()
                    .map_err(|e| CliError::invalid_amount("--payment", e))?;
                client.buy_with_payment(id, buyer, payment)?
            }
            None => client.buy(id, buyer)?,
        };
        format.write(writer, &receipt)
    }
}
