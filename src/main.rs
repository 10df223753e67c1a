//! spectrum-ops - operator commands for the Spectrum marketplace contracts
//!
//! Four commands: deploy the token/marketplace pair, deploy the marketplace
//! behind an upgradeable proxy, upgrade an existing proxy, and replace a
//! pending transaction by resubmitting its nonce with a higher priority fee.

use anyhow::Result;
use clap::Parser;
use ethers::signers::{LocalWallet, Signer};
use std::sync::Arc;
use tracing::info;

mod artifact;
mod chain;
mod cli;
mod commands;
mod config;
mod error;
mod tx;

use chain::ChainClient;
use cli::{Cli, Command};
use config::{Settings, WalletConfig};
use error::{OpsError, OpsResult};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    let client = Arc::new(ChainClient::connect(&settings.network).await?);
    let wallet = load_wallet(&settings.wallet)?.with_chain_id(client.chain_id());
    info!(
        "Using wallet {:?} on chain {}",
        wallet.address(),
        client.chain_id()
    );

    match cli.command {
        Command::Replace(args) => {
            // Submission rejections are logged, not fatal: the replace
            // command exits 0 whenever both submissions were dispatched.
            commands::replace::run(&settings, args, client, wallet).await?;
        }
        Command::Deploy => {
            commands::deploy::run(&settings, client.signer(wallet)).await?;
        }
        Command::DeployProxy => {
            commands::proxy::deploy_proxy(&settings, client.signer(wallet)).await?;
        }
        Command::Upgrade(args) => {
            commands::proxy::upgrade(&settings, args, client.signer(wallet)).await?;
        }
    }

    Ok(())
}

/// Load the signing wallet from the environment variable named in config
fn load_wallet(config: &WalletConfig) -> OpsResult<LocalWallet> {
    let key = std::env::var(&config.private_key_env).map_err(|_| {
        OpsError::Wallet(format!(
            "No wallet configured. Set {}",
            config.private_key_env
        ))
    })?;
    key.parse::<LocalWallet>()
        .map_err(|e| OpsError::Wallet(format!("Invalid private key: {}", e)))
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spectrum_ops=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
