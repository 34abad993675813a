use crate::{
    contract::{
        Address,
        ContractError,
        PlatformContract,
    },
    network::{
        self,
        NetworkDescriptor,
        NetworkError,
        NetworkOutcome,
    },
    rpc::RpcError,
    wallet::WalletProvider,
};
use thiserror::Error;
use tracing::{
    error,
    info,
};

pub const WALLET_INSTALL_URL: &str = "https://metamask.io/download.html";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Where the platform lives and which network it must be reached on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformConfig {
    pub address: Address,
    pub network: NetworkDescriptor,
}

#[derive(Clone, Debug)]
pub struct Session<W> {
    pub account: Address,
    pub contract: PlatformContract<W>,
    pub role: Role,
}

/// Outcome of a successful `connect`, committed by the state container.
#[derive(Clone, Debug)]
pub struct Connected<W> {
    pub account: Address,
    pub contract: PlatformContract<W>,
    pub chain_id: String,
    pub network: NetworkOutcome,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("no wallet detected; install one from {}", WALLET_INSTALL_URL)]
    NoWallet,
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{0}")]
    Authorization(RpcError),
    #[error("the wallet did not authorize any account")]
    NoAccounts,
    #[error("cannot bind the platform contract: {0}")]
    Contract(ContractError),
}

/// Network guard, account authorization and contract binding, in that order.
/// Nothing is returned unless all three succeed.
pub async fn connect<W: WalletProvider>(
    wallet: Option<&W>,
    platform: &PlatformConfig,
) -> Result<Connected<W>, ConnectError> {
    let Some(wallet) = wallet else {
        return Err(ConnectError::NoWallet);
    };
    info!("connecting wallet");
    let result = connect_inner(wallet, platform).await;
    if let Err(err) = &result {
        error!(%err, "wallet connection failed");
    }
    result
}

async fn connect_inner<W: WalletProvider>(
    wallet: &W,
    platform: &PlatformConfig,
) -> Result<Connected<W>, ConnectError> {
    let network = network::ensure_network(wallet, &platform.network).await?;

    let accounts = wallet
        .request_accounts()
        .await
        .map_err(ConnectError::Authorization)?;
    let first = accounts.first().ok_or(ConnectError::NoAccounts)?;
    let account: Address = first.parse().map_err(ConnectError::Contract)?;

    info!(platform = %platform.address, %account, "binding platform contract");
    let contract = PlatformContract::new(wallet.clone(), platform.address, account);

    Ok(Connected {
        account,
        contract,
        chain_id: platform.network.chain_id.to_string(),
        network,
    })
}
