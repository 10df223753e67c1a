//! Compiled-contract artifact handling
//!
//! Reads hardhat-style artifact JSON (`abi` + `bytecode`) for deployment and
//! writes the `{address, abi}` files the marketplace frontend consumes.

use crate::error::{OpsError, OpsResult};

use ethers::abi::Abi;
use ethers::types::{Address, Bytes};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Compiled contract artifact as emitted by the toolchain
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: Option<String>,
    pub abi: Value,
    pub bytecode: String,
}

impl ContractArtifact {
    /// Load an artifact from disk
    pub fn load(path: &Path) -> OpsResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| OpsError::Artifact(format!("read {:?}: {}", path, e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| OpsError::Artifact(format!("parse {:?}: {}", path, e)))
    }

    /// Parsed ABI for contract-factory construction
    pub fn abi(&self) -> OpsResult<Abi> {
        serde_json::from_value(self.abi.clone())
            .map_err(|e| OpsError::Artifact(format!("invalid abi: {}", e)))
    }

    /// Deployment bytecode
    pub fn bytecode(&self) -> OpsResult<Bytes> {
        self.bytecode
            .parse()
            .map_err(|e| OpsError::Artifact(format!("invalid bytecode: {}", e)))
    }
}

/// Address plus ABI, as the frontend expects it
#[derive(Debug, Serialize)]
struct FrontendArtifact<'a> {
    address: String,
    abi: &'a Value,
}

/// Write the `{address, abi}` artifact for a deployed contract
pub fn write_frontend_artifact(path: &Path, address: Address, abi: &Value) -> OpsResult<()> {
    let artifact = FrontendArtifact {
        address: to_checksum(&address, None),
        abi,
    };
    let json = serde_json::to_string(&artifact)
        .map_err(|e| OpsError::Artifact(format!("serialize {:?}: {}", path, e)))?;
    std::fs::write(path, json)
        .map_err(|e| OpsError::Artifact(format!("write {:?}: {}", path, e)))?;
    info!("Wrote frontend artifact {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "contractName": "Marketplace",
        "abi": [
            {
                "inputs": [],
                "name": "initialvalue",
                "outputs": [],
                "stateMutability": "nonpayable",
                "type": "function"
            }
        ],
        "bytecode": "0x6080604052"
    }"#;

    #[test]
    fn loads_artifact_and_parses_abi() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let artifact = ContractArtifact::load(file.path()).unwrap();
        assert_eq!(artifact.contract_name.as_deref(), Some("Marketplace"));
        assert_eq!(
            artifact.bytecode().unwrap(),
            Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52])
        );

        let abi = artifact.abi().unwrap();
        assert!(abi.function("initialvalue").is_ok());
    }

    #[test]
    fn writes_frontend_artifact_with_checksummed_address() {
        let artifact: ContractArtifact = serde_json::from_str(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Marketplace.json");
        let address: Address = "0x8fa461074fc99d7b874569869b2559addd00d9ad"
            .parse()
            .unwrap();

        write_frontend_artifact(&path, address, &artifact.abi).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written["address"],
            "0x8Fa461074FC99D7B874569869b2559Addd00d9AD"
        );
        assert!(written["abi"].is_array());
    }
}
