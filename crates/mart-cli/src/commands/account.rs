//! Account commands: mint, owned, faucet, balance.

use std::io::Write;

use mart_market::MarketClient;
use mart_token::{Address, Wei};

use crate::error::CliError;
use crate::output::{AssetList, BalanceView, Minted, OutputFormat};

/// Account command executor.
pub struct AccountCommand {
    account: Address,
}

impl AccountCommand {
    /// Create a command acting as `account`.
    #[must_use]
    pub const fn new(account: Address) -> Self {
        Self { account }
    }

    /// Mint a new asset to the account.
    pub fn mint<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let asset_id = client.mint(&self.account);
        format.write(
            writer,
            &Minted {
                owner: self.account.to_string(),
                asset_id: asset_id.value(),
            },
        )
    }

    /// List the assets the account owns.
    pub fn owned<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let assets = client.owned_assets(&self.account)?;
        format.write(
            writer,
            &AssetList {
                owner: self.account.to_string(),
                assets: assets.into_iter().map(|a| a.value()).collect(),
            },
        )
    }

    /// Credit free ETH to the account.
    pub fn faucet<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
        amount: &str,
    ) -> Result<(), CliError> {
        let amount: Wei = amount
            .parse()
            .map_err(|e| CliError::invalid_amount("amount", e))?;
        let balance = client.faucet(&self.account, amount)?;
        format.write(
            writer,
            &BalanceView {
                account: self.account.to_string(),
                balance: balance.to_string(),
            },
        )
    }

    /// Show the account's balance.
    pub fn balance<W: Write>(
        &self,
        client: &MarketClient,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        format.write(
            writer,
            &BalanceView {
                account: self.account.to_string(),
                balance: client.balance(&self.account).to_string(),
            },
        )
    }
}
