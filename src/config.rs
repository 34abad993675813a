use crate::{
    contract::Address,
    deployment::{
        self,
        DeploymentStore,
    },
    network::{
        NetworkDescriptor,
        SEPOLIA,
    },
    session::PlatformConfig,
};
use clap::Parser;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    path::PathBuf,
    time::Duration,
};
use tracing::info;

/// Platform deployment used when neither the command line nor the
/// deployment records name one.
pub const DEFAULT_PLATFORM_ADDRESS: &str = "0x03A54407c196c56FA54732FfBFF1FDfaE6b79ADb";
pub const DEFAULT_LOG_DIR: &str = "~/.microcredit/logs";

#[derive(Parser, Debug)]
#[command(
    name = "microcredit-dapp",
    about = "Terminal client for the microcredit lending platform",
    version
)]
pub struct Args {
    /// Wallet JSON-RPC bridge; without it the client runs with no wallet
    #[arg(long, env = "MICROCREDIT_WALLET_URL")]
    pub wallet_url: Option<String>,

    /// Lending platform contract (defaults to the latest recorded deployment)
    #[arg(long)]
    pub platform_address: Option<Address>,

    /// Deployment records file
    #[arg(long, default_value_os_t = deployment::default_path("sepolia"))]
    pub deployments: PathBuf,

    /// Seconds between ETH/USDT oracle reads
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub price_interval_secs: u64,

    /// Milliseconds between wallet account/network polls
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
    pub event_poll_millis: u64,

    /// Log directory
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: String,

    /// tracing filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub wallet_url: Option<String>,
    pub platform: PlatformConfig,
    pub price_interval: Duration,
    pub event_poll_interval: Duration,
    pub log_dir: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let store = DeploymentStore::new(&args.deployments);
        let address = resolve_platform_address(args.platform_address, &store, &SEPOLIA)?;
        Ok(Self {
            wallet_url: args.wallet_url,
            platform: PlatformConfig {
                address,
                network: SEPOLIA,
            },
            price_interval: Duration::from_secs(args.price_interval_secs),
            event_poll_interval: Duration::from_millis(args.event_poll_millis),
            log_dir: resolve_log_dir(&args.log_dir),
            log_filter: args.log_filter,
        })
    }
}

/// Command line first, then the newest recorded deployment on `network`,
/// then the built-in address.
pub fn resolve_platform_address(
    explicit: Option<Address>,
    store: &DeploymentStore,
    network: &NetworkDescriptor,
) -> Result<Address> {
    if let Some(address) = explicit {
        return Ok(address);
    }
    if let Some(record) = store.latest_for(network.chain_id)? {
        info!(path = %store.path().display(), deployed_at = %record.deployed_at, "using recorded platform deployment");
        return record.address();
    }
    DEFAULT_PLATFORM_ADDRESS
        .parse::<Address>()
        .wrap_err("Invalid built-in platform address")
}

pub fn resolve_log_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
