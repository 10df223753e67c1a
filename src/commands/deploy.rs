//! The `deploy` command
//!
//! Deploys the tradable token and the marketplace, writes the `{address,
//! abi}` artifacts the frontend reads, and hands token ownership to the
//! marketplace. Any failure aborts the run with a non-zero exit.

use crate::artifact::{write_frontend_artifact, ContractArtifact};
use crate::chain::OpsClient;
use crate::config::Settings;
use crate::error::{OpsError, OpsResult};

use ethers::contract::ContractFactory;
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::sync::Arc;
use tracing::info;

/// Blocks to wait before a deployment is considered done
const DEPLOY_CONFIRMATIONS: usize = 1;

pub async fn run(settings: &Settings, client: Arc<OpsClient>) -> OpsResult<()> {
    let config = settings
        .deploy
        .as_ref()
        .ok_or_else(|| OpsError::Config("missing [deploy] section".to_string()))?;

    info!("Start deployment");

    info!("Deploying tradable token");
    let token_artifact = ContractArtifact::load(&config.token_artifact)?;
    let token_factory = ContractFactory::new(
        token_artifact.abi()?,
        token_artifact.bytecode()?,
        client.clone(),
    );
    let token = token_factory
        .deploy((
            config.token_name.clone(),
            config.token_symbol.clone(),
            config.token_base_uri.clone(),
        ))
        .map_err(|e| OpsError::Deployment(e.to_string()))?
        .confirmations(DEPLOY_CONFIRMATIONS)
        .send()
        .await
        .map_err(|e| OpsError::Deployment(e.to_string()))?;
    info!(
        "Tradable token deployed at {}",
        to_checksum(&token.address(), None)
    );
    write_frontend_artifact(
        &config.frontend_dir.join("tradable.json"),
        token.address(),
        &token_artifact.abi,
    )?;

    info!("Deploying marketplace");
    let fee_recipient: Address = config.fee_recipient.parse().map_err(|_| {
        OpsError::Config(format!(
            "invalid fee recipient address: {}",
            config.fee_recipient
        ))
    })?;
    let market_artifact = ContractArtifact::load(&config.market_artifact)?;
    let market_factory = ContractFactory::new(
        market_artifact.abi()?,
        market_artifact.bytecode()?,
        client.clone(),
    );
    let market = market_factory
        .deploy((token.address(), fee_recipient))
        .map_err(|e| OpsError::Deployment(e.to_string()))?
        .confirmations(DEPLOY_CONFIRMATIONS)
        .send()
        .await
        .map_err(|e| OpsError::Deployment(e.to_string()))?;
    info!(
        "Marketplace deployed at {}",
        to_checksum(&market.address(), None)
    );
    write_frontend_artifact(
        &config.frontend_dir.join("Marketplace.json"),
        market.address(),
        &market_artifact.abi,
    )?;

    info!("Transferring token ownership to the marketplace");
    token
        .method::<_, ()>("transferOwnership", market.address())
        .map_err(|e| OpsError::Contract(e.to_string()))?
        .send()
        .await
        .map_err(|e| OpsError::Contract(e.to_string()))?
        .await
        .map_err(|e| OpsError::Contract(e.to_string()))?;

    info!("Deployment complete");
    Ok(())
}
