//! Error types for the operator tool

use thiserror::Error;

/// Main error type for operator commands
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Chain connection error: {0}")]
    ChainConnection(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Deployment error: {0}")]
    Deployment(String),

    #[error("Contract error: {0}")]
    Contract(String),
}

/// Result type for operator commands
pub type OpsResult<T> = Result<T, OpsError>;
