//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use mart_market::{Order, SettlementReceipt};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A one-line confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// A freshly minted asset.
#[derive(Debug, Clone, Serialize)]
pub struct Minted {
    /// Account that received it.
    pub owner: String,
    /// New asset id.
    pub asset_id: u64,
}

impl TableDisplay for Minted {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Minted asset #{} to {}", self.asset_id, self.owner)?;
        Ok(())
    }
}

/// Assets owned by an account.
#[derive(Debug, Clone, Serialize)]
pub struct AssetList {
    /// The owner.
    pub owner: String,
    /// Owned asset ids.
    pub assets: Vec<u64>,
}

impl TableDisplay for AssetList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.assets.is_empty() {
            writeln!(writer, "{} owns no assets", self.owner)?;
            return Ok(());
        }
        writeln!(writer, "Assets owned by {}", self.owner)?;
        for id in &self.assets {
            writeln!(writer, "  #{id}")?;
        }
        Ok(())
    }
}

/// An account balance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    /// The account.
    pub account: String,
    /// Balance in ETH.
    pub balance: String,
}

impl TableDisplay for BalanceView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", self.account, self.balance)?;
        Ok(())
    }
}

/// A newly posted order.
#[derive(Debug, Clone, Serialize)]
pub struct Posted {
    /// Assigned order id.
    pub order_id: u64,
    /// Listed asset.
    pub asset_id: u64,
    /// Ask price.
    pub price: String,
}

impl TableDisplay for Posted {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Posted order {} for asset #{} at {}",
            self.order_id, self.asset_id, self.price
        )?;
        Ok(())
    }
}

/// One row of the order listing.
#[derive(Debug, Clone, Serialize)]
pub struct OrderInfo {
    /// Order id.
    pub id: u64,
    /// Registry of the asset.
    pub registry: String,
    /// Listed asset.
    pub asset_id: u64,
    /// Seller.
    pub seller: String,
    /// Ask price.
    pub price: String,
    /// Current status.
    pub status: String,
    /// Buyer, once filled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
}

impl From<&Order> for OrderInfo {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().value(),
            registry: order.registry().to_string(),
            asset_id: order.asset_id().value(),
            seller: order.creator().to_string(),
            price: order.price().to_string(),
            status: order.status().to_string(),
            buyer: order.buyer().map(ToString::to_string),
        }
    }
}

/// Orders for display.
#[derive(Debug, Clone, Serialize)]
pub struct OrderList {
    /// Orders in id order.
    pub orders: Vec<OrderInfo>,
}

impl TableDisplay for OrderList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.orders.is_empty() {
            writeln!(writer, "No orders")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:>5}  {:<14}  {:>6}  {:<16}  {:<24}  {:<9}  {:<16}",
            "ID", "REGISTRY", "ASSET", "SELLER", "PRICE", "STATUS", "BUYER"
        )?;
        writeln!(writer, "{}", "─".repeat(104))?;

        for order in &self.orders {
            writeln!(
                writer,
                "{:>5}  {:<14}  {:>6}  {:<16}  {:<24}  {:<9}  {:<16}",
                order.id,
                truncate(&order.registry, 14),
                order.asset_id,
                truncate(&order.seller, 16),
                order.price,
                order.status,
                order.buyer.as_deref().map_or_else(|| "-".to_string(), |b| truncate(b, 16)),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} order(s)", self.orders.len())?;
        Ok(())
    }
}

/// Current price of an order.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    /// Order id.
    pub order_id: u64,
    /// Ask price.
    pub price: String,
    /// ETH required right now.
    pub required: String,
    /// Oracle rate used, if the price needed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
}

impl TableDisplay for QuoteView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Order {}", self.order_id)?;
        writeln!(writer, "  Price:     {}", self.price)?;
        if let Some(rate) = &self.rate {
            writeln!(writer, "  Rate:      {rate}")?;
        }
        writeln!(writer, "  Required:  {}", self.required)?;
        Ok(())
    }
}

impl TableDisplay for SettlementReceipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Order {} filled", self.order_id)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Asset:      #{} ({})", self.asset_id, self.registry)?;
        writeln!(writer, "Buyer:      {}", self.buyer)?;
        writeln!(writer, "Seller:     {}", self.seller)?;
        writeln!(writer, "Required:   {}", self.required)?;
        writeln!(writer, "Paid:       {}", self.paid)?;
        writeln!(writer, "Forwarded:  {}", self.forwarded)?;
        writeln!(writer, "Refunded:   {}", self.refunded)?;
        Ok(())
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_table() {
        let out = OutputFormat::default()
            .to_string(&Message::success("done"))
            .expect("render");
        assert_eq!(out, "done\n");
    }

    #[test]
    fn message_json() {
        let out = OutputFormat::new(Format::Json)
            .to_string(&Message::success("done"))
            .expect("render");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["message"], "done");
    }

    #[test]
    fn empty_order_list() {
        let out = OutputFormat::default()
            .to_string(&OrderList { orders: vec![] })
            .expect("render");
        assert!(out.contains("No orders"));
    }

    #[test]
    fn order_list_rows() {
        let list = OrderList {
            orders: vec![OrderInfo {
                id: 0,
                registry: "example-nft".into(),
                asset_id: 1,
                seller: "alice".into(),
                price: "100 USD".into(),
                status: "Open".into(),
                buyer: None,
            }],
        };
        let out = OutputFormat::default().to_string(&list).expect("render");
        assert!(out.contains("100 USD"));
        assert!(out.contains("Total: 1 order(s)"));
    }

    #[test]
    fn buyer_omitted_from_json_until_filled() {
        let info = OrderInfo {
            id: 0,
            registry: "nft".into(),
            asset_id: 1,
            seller: "alice".into(),
            price: "1 ETH".into(),
            status: "Open".into(),
            buyer: None,
        };
        let json = serde_json::to_string(&info).expect("json");
        assert!(!json.contains("buyer"));
    }

    #[test]
    fn truncate_long_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-account-name", 10), "a-very-...");
    }
}
