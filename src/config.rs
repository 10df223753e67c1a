//! Configuration for the operator tool
//!
//! Loads configuration from a TOML file with environment variable
//! substitution. Secrets never live in the file itself: the wallet section
//! names the environment variable holding the private key.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub replace: Option<ReplaceConfig>,
    pub deploy: Option<DeployConfig>,
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

fn default_private_key_env() -> String {
    "SPECTRUM_PRIVATE_KEY".to_string()
}

/// Settings for the `replace` command: a pair of transaction intents
/// sharing one nonce, plus the grace period bounding the wait for their
/// submission outcomes.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceConfig {
    /// Fixed nonce for both intents; when absent the account's live nonce
    /// is used instead
    pub nonce: Option<u64>,
    /// Milliseconds to wait for both submission outcomes before giving up
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    pub original: IntentConfig,
    pub replacement: IntentConfig,
}

fn default_grace_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    pub gas: u64,
    pub max_priority_fee_per_gas: u64,
    /// When absent, derived from the latest block base fee at run time
    pub max_fee_per_gas: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Compiled artifact (abi + bytecode) for the tradable token contract
    pub token_artifact: PathBuf,
    /// Compiled artifact for the marketplace contract
    pub market_artifact: PathBuf,
    pub token_name: String,
    pub token_symbol: String,
    #[serde(default)]
    pub token_base_uri: String,
    /// Address receiving marketplace fees
    pub fee_recipient: String,
    /// Directory where frontend `{address, abi}` artifacts are written
    pub frontend_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Compiled artifact for the upgradeable proxy contract
    pub proxy_artifact: PathBuf,
    /// Compiled artifact for the marketplace implementation
    pub implementation_artifact: PathBuf,
    /// Owner of the proxy admin
    pub owner: String,
    /// Proxy admin contract address (required by `upgrade`)
    pub admin: Option<String>,
    /// Initializer function signature, e.g. "initialvalue()"
    #[serde(default = "default_initializer")]
    pub initializer: String,
}

fn default_initializer() -> String {
    "initialvalue()".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.network.rpc_url.is_empty() {
            anyhow::bail!("network.rpc_url must not be empty");
        }

        if let Some(replace) = &self.replace {
            // The replacement can only win the nonce race with a strictly
            // higher priority fee; reject the pair up front otherwise.
            if replace.replacement.max_priority_fee_per_gas
                <= replace.original.max_priority_fee_per_gas
            {
                anyhow::bail!(
                    "replace.replacement.max_priority_fee_per_gas ({}) must exceed the original's ({})",
                    replace.replacement.max_priority_fee_per_gas,
                    replace.original.max_priority_fee_per_gas
                );
            }
            if replace.original.gas == 0 || replace.replacement.gas == 0 {
                anyhow::bail!("replace intents must carry a non-zero gas limit");
            }
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
