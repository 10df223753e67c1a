//! Chain client - HTTP provider access, fee queries, and raw broadcast
//!
//! Wraps a single JSON-RPC endpoint. The chain id is queried once at connect
//! time and bound into the wallet before any signing happens.

use crate::config::NetworkConfig;
use crate::error::{OpsError, OpsResult};

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Signing client used by the deployment commands
pub type OpsClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Seam for raw transaction submission.
///
/// A submission completes as soon as the node accepts or rejects the raw
/// bytes; it does not wait for block inclusion.
#[async_trait]
pub trait Broadcast: Send + Sync {
    async fn broadcast(&self, raw: Bytes) -> OpsResult<H256>;
}

/// Client for a single chain endpoint
pub struct ChainClient {
    provider: Provider<Http>,
    chain_id: u64,
}

impl ChainClient {
    /// Connect to the configured endpoint and query its chain id
    pub async fn connect(config: &NetworkConfig) -> OpsResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| OpsError::ChainConnection(e.to_string()))?
            .interval(Duration::from_millis(100));

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| OpsError::ChainConnection(e.to_string()))?
            .as_u64();

        debug!("Connected to chain {}", chain_id);

        Ok(Self { provider, chain_id })
    }

    /// Chain id of the connected endpoint
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build a signing client for contract deployment and interaction
    pub fn signer(&self, wallet: LocalWallet) -> Arc<OpsClient> {
        Arc::new(SignerMiddleware::new(
            self.provider.clone(),
            wallet.with_chain_id(self.chain_id),
        ))
    }

    /// Current confirmed transaction count (nonce) of an account
    pub async fn account_nonce(&self, address: Address) -> OpsResult<u64> {
        let nonce = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Latest.into()))
            .await
            .map_err(|e| OpsError::ChainConnection(e.to_string()))?;
        Ok(nonce.as_u64())
    }

    /// Current gas price
    pub async fn gas_price(&self) -> OpsResult<U256> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| OpsError::GasEstimation(e.to_string()))
    }

    /// Derive a max fee for a given priority fee from the latest block.
    ///
    /// Max fee = 2 * base_fee + priority_fee, leaving headroom for base fee
    /// movement between submission and inclusion.
    pub async fn max_fee_for(&self, priority_fee: U256) -> OpsResult<U256> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| OpsError::GasEstimation(e.to_string()))?
            .ok_or_else(|| OpsError::GasEstimation("No latest block".to_string()))?;

        let base_fee = block
            .base_fee_per_gas
            .ok_or_else(|| OpsError::GasEstimation("No base fee in block".to_string()))?;

        Ok(base_fee * 2 + priority_fee)
    }
}

#[async_trait]
impl Broadcast for ChainClient {
    async fn broadcast(&self, raw: Bytes) -> OpsResult<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| OpsError::Submission(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}
