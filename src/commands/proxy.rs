//! The `deploy-proxy` and `upgrade` commands
//!
//! `deploy-proxy` puts a fresh marketplace implementation behind an
//! upgradeable proxy with an initializer call. `upgrade` deploys a new
//! implementation and points an existing proxy at it through the proxy
//! admin.

use crate::artifact::ContractArtifact;
use crate::chain::OpsClient;
use crate::cli::UpgradeArgs;
use crate::config::{ProxyConfig, Settings};
use crate::error::{OpsError, OpsResult};

use ethers::abi::Token;
use ethers::contract::ContractFactory;
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, TransactionRequest};
use ethers::utils::{id, to_checksum};
use std::sync::Arc;
use tracing::info;

/// Blocks to wait before a deployment is considered done
const DEPLOY_CONFIRMATIONS: usize = 1;

fn proxy_config(settings: &Settings) -> OpsResult<&ProxyConfig> {
    settings
        .proxy
        .as_ref()
        .ok_or_else(|| OpsError::Config("missing [proxy] section".to_string()))
}

fn parse_address(label: &str, value: &str) -> OpsResult<Address> {
    value
        .parse()
        .map_err(|_| OpsError::Config(format!("invalid {} address: {}", label, value)))
}

/// Selector-only calldata for a no-argument initializer
fn initializer_calldata(signature: &str) -> Bytes {
    let signature = if signature.contains('(') {
        signature.to_string()
    } else {
        format!("{}()", signature)
    };
    Bytes::from(id(signature).to_vec())
}

async fn deploy_implementation(
    config: &ProxyConfig,
    client: Arc<OpsClient>,
) -> OpsResult<Address> {
    let artifact = ContractArtifact::load(&config.implementation_artifact)?;
    let factory = ContractFactory::new(artifact.abi()?, artifact.bytecode()?, client);
    let contract = factory
        .deploy(())
        .map_err(|e| OpsError::Deployment(e.to_string()))?
        .confirmations(DEPLOY_CONFIRMATIONS)
        .send()
        .await
        .map_err(|e| OpsError::Deployment(e.to_string()))?;
    info!(
        "Implementation deployed at {}",
        to_checksum(&contract.address(), None)
    );
    Ok(contract.address())
}

pub async fn deploy_proxy(settings: &Settings, client: Arc<OpsClient>) -> OpsResult<()> {
    let config = proxy_config(settings)?;

    let gas_price = client
        .get_gas_price()
        .await
        .map_err(|e| OpsError::GasEstimation(e.to_string()))?;
    info!("Start deployment at gas price {}", gas_price);

    let implementation = deploy_implementation(config, client.clone()).await?;
    let owner = parse_address("owner", &config.owner)?;
    let init_calldata = initializer_calldata(&config.initializer);

    let proxy_artifact = ContractArtifact::load(&config.proxy_artifact)?;
    let proxy_factory = ContractFactory::new(
        proxy_artifact.abi()?,
        proxy_artifact.bytecode()?,
        client,
    );
    let proxy = proxy_factory
        .deploy((implementation, owner, init_calldata))
        .map_err(|e| OpsError::Deployment(e.to_string()))?
        .confirmations(DEPLOY_CONFIRMATIONS)
        .send()
        .await
        .map_err(|e| OpsError::Deployment(e.to_string()))?;

    info!(
        "Contract deployed behind proxy at {}",
        to_checksum(&proxy.address(), None)
    );
    Ok(())
}

pub async fn upgrade(
    settings: &Settings,
    args: UpgradeArgs,
    client: Arc<OpsClient>,
) -> OpsResult<()> {
    let config = proxy_config(settings)?;
    let admin_address = config
        .admin
        .as_deref()
        .ok_or_else(|| OpsError::Config("proxy.admin is required for upgrade".to_string()))?;
    let admin = parse_address("admin", admin_address)?;
    let proxy = parse_address("proxy", &args.proxy)?;

    let gas_price = client
        .get_gas_price()
        .await
        .map_err(|e| OpsError::GasEstimation(e.to_string()))?;
    info!("Start upgrade at gas price {}", gas_price);

    let implementation = deploy_implementation(config, client.clone()).await?;

    // upgrade(address proxy, address implementation) on the proxy admin
    let mut data = id("upgrade(address,address)").to_vec();
    data.extend(ethers::abi::encode(&[
        Token::Address(proxy),
        Token::Address(implementation),
    ]));

    let tx = TransactionRequest::new().to(admin).data(data);
    let receipt = client
        .send_transaction(tx, None)
        .await
        .map_err(|e| OpsError::Contract(e.to_string()))?
        .await
        .map_err(|e| OpsError::Contract(e.to_string()))?
        .ok_or_else(|| OpsError::Contract("upgrade transaction dropped".to_string()))?;

    info!(
        "Proxy {} upgraded to implementation {} in block {:?}",
        to_checksum(&proxy, None),
        to_checksum(&implementation, None),
        receipt.block_number
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_initializer_name_gets_empty_arg_list() {
        assert_eq!(
            initializer_calldata("initialvalue"),
            initializer_calldata("initialvalue()")
        );
    }

    #[test]
    fn upgrade_selector_is_four_bytes() {
        let selector = id("upgrade(address,address)");
        assert_eq!(selector.len(), 4);
    }
}
