//! Stablemart CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mart_cli::cli::{Cli, Commands};
use mart_cli::commands::{AccountCommand, InitConfigCommand, OrdersCommand, TradeCommand};
use mart_cli::output::OutputFormat;
use mart_cli::session;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    if let Commands::InitConfig { output, force } = &cli.command {
        InitConfigCommand::execute(&mut stdout, &format, output, *force)?;
        return Ok(());
    }

    let mut client = session::connect(cli).context("failed to open marketplace")?;

    match &cli.command {
        Commands::Mint => AccountCommand::new(cli.account()?).mint(&client, &mut stdout, &format)?,
        Commands::Owned => AccountCommand::new(cli.account()?).owned(&client, &mut stdout, &format)?,
        Commands::Faucet { amount } => {
            AccountCommand::new(cli.account()?).faucet(&client, &mut stdout, &format, amount)?;
        }
        Commands::Balance => {
            AccountCommand::new(cli.account()?).balance(&client, &mut stdout, &format)?;
        }
        Commands::Post(args) => {
            OrdersCommand::new(Some(cli.account()?)).post(&mut client, &mut stdout, &format, args)?;
        }
        Commands::Cancel { order_id } => {
            OrdersCommand::new(Some(cli.account()?)).cancel(&mut client, &mut stdout, &format, *order_id)?;
        }
        Commands::Orders { all } => {
            OrdersCommand::new(None).list(&client, &mut stdout, &format, *all)?;
        }
        Commands::Quote { order_id } => {
            TradeCommand::new(None).quote(&client, &mut stdout, &format, *order_id)?;
        }
        Commands::Buy { order_id, payment } => {
            TradeCommand::new(Some(cli.account()?)).buy(
                &mut client,
                &mut stdout,
                &format,
                *order_id,
                payment.as_deref(),
            )?;
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
