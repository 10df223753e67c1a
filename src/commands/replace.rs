//! The `replace` command
//!
//! Attempts to supersede an unconfirmed transaction by resubmitting its
//! nonce with a strictly higher priority fee. The account's live nonce is
//! always queried and logged; the nonce actually signed is, in order of
//! precedence, the CLI override, the configured fixed value, or the queried
//! value itself.

use crate::chain::ChainClient;
use crate::cli::ReplaceArgs;
use crate::config::{IntentConfig, Settings};
use crate::error::{OpsError, OpsResult};
use crate::tx::{ReplacementPair, ReplacementSubmitter, TxIntent};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Where the nonce in use came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonceSource {
    Override,
    Configured,
    Queried,
}

fn resolve_nonce(
    cli_override: Option<u64>,
    configured: Option<u64>,
    queried: u64,
) -> (u64, NonceSource) {
    match (cli_override, configured) {
        (Some(nonce), _) => (nonce, NonceSource::Override),
        (None, Some(nonce)) => (nonce, NonceSource::Configured),
        (None, None) => (queried, NonceSource::Queried),
    }
}

async fn build_intent(
    config: &IntentConfig,
    nonce: u64,
    to: Address,
    client: &ChainClient,
) -> OpsResult<TxIntent> {
    let priority_fee = U256::from(config.max_priority_fee_per_gas);
    let max_fee = match config.max_fee_per_gas {
        Some(fee) => U256::from(fee),
        None => client.max_fee_for(priority_fee).await?,
    };
    Ok(TxIntent {
        to,
        value: U256::zero(),
        gas: U256::from(config.gas),
        max_priority_fee_per_gas: priority_fee,
        max_fee_per_gas: max_fee,
        nonce,
    })
}

pub async fn run(
    settings: &Settings,
    args: ReplaceArgs,
    client: Arc<ChainClient>,
    wallet: LocalWallet,
) -> OpsResult<()> {
    let config = settings
        .replace
        .as_ref()
        .ok_or_else(|| OpsError::Config("missing [replace] section".to_string()))?;

    let address = wallet.address();
    let queried = client.account_nonce(address).await?;
    let (nonce, source) = resolve_nonce(args.nonce, config.nonce, queried);
    info!(queried, nonce, ?source, "Resolved replacement nonce");

    if nonce < queried {
        warn!(
            "Account nonce is already at {}; both submissions for nonce {} will be rejected as stale",
            queried, nonce
        );
    }

    // A zero-value self-send is the canonical cancel shape
    let original = build_intent(&config.original, nonce, address, client.as_ref()).await?;
    let replacement = build_intent(&config.replacement, nonce, address, client.as_ref()).await?;
    let pair = ReplacementPair::new(original, replacement)?;

    let grace = Duration::from_millis(args.grace_ms.unwrap_or(config.grace_ms));
    let chain_id = client.chain_id();
    let submitter = ReplacementSubmitter::new(client, wallet, chain_id);

    let report = submitter.run(&pair, grace).await?;
    info!(
        original = ?report.original,
        replacement = ?report.replacement,
        "Replacement attempt finished; check the mempool to view the status of your transactions"
    );

    Ok(())
}
