//! CLI arguments and subcommands for the operator tool

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spectrum-ops", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/ops.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Supersede a pending transaction by resubmitting its nonce with a
    /// higher priority fee
    Replace(ReplaceArgs),
    /// Deploy the tradable token and marketplace contracts and write the
    /// frontend artifacts
    Deploy,
    /// Deploy the marketplace implementation behind an upgradeable proxy
    DeployProxy,
    /// Upgrade an existing proxy to a freshly deployed implementation
    Upgrade(UpgradeArgs),
}

#[derive(Args)]
pub struct ReplaceArgs {
    /// Nonce to use for both transactions, overriding the configured value;
    /// when neither is set the account's live nonce is used
    #[arg(long)]
    pub nonce: Option<u64>,

    /// Milliseconds to wait for both submission outcomes, overriding the
    /// configured grace period
    #[arg(long)]
    pub grace_ms: Option<u64>,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the upgradeable proxy contract
    #[arg(short, long)]
    pub proxy: String,
}
