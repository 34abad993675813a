use crate::{
    rpc::{
        RpcError,
        UNRECOGNIZED_CHAIN,
    },
    wallet::WalletProvider,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Parameters of `wallet_addEthereumChain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub chain_id: &'static str,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
}

pub const SEPOLIA: NetworkDescriptor = NetworkDescriptor {
    chain_id: "0xaa36a7",
    chain_name: "Sepolia Test Network",
    native_currency: NativeCurrency {
        name: "SepoliaETH",
        symbol: "ETH",
        decimals: 18,
    },
    rpc_urls: &["https://sepolia.infura.io/v3/"],
    block_explorer_urls: &["https://sepolia.etherscan.io"],
};

impl NetworkDescriptor {
    pub fn matches(&self, chain_id: &str) -> bool {
        self.chain_id.eq_ignore_ascii_case(chain_id.trim())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkOutcome {
    AlreadyOnNetwork,
    Switched { from: String },
    Added { from: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("failed to read the wallet's network: {0}")]
    ChainQuery(RpcError),
    #[error("please add the {network} manually")]
    AddRejected {
        network: &'static str,
        source: RpcError,
    },
    #[error("{0}")]
    Switch(RpcError),
}

/// Moves the wallet onto `required`, registering the network when the wallet
/// does not know it yet.
pub async fn ensure_network<W: WalletProvider>(
    wallet: &W,
    required: &NetworkDescriptor,
) -> Result<NetworkOutcome, NetworkError> {
    let current = wallet.chain_id().await.map_err(NetworkError::ChainQuery)?;
    info!(%current, required = required.chain_id, "checking wallet network");
    if required.matches(&current) {
        return Ok(NetworkOutcome::AlreadyOnNetwork);
    }

    match wallet.switch_chain(required.chain_id).await {
        Ok(()) => {
            info!(from = %current, to = required.chain_id, "wallet switched network");
            Ok(NetworkOutcome::Switched { from: current })
        }
        Err(err) if err.code() == Some(UNRECOGNIZED_CHAIN) => {
            info!(
                chain = required.chain_name,
                "wallet does not know the network, requesting registration"
            );
            wallet
                .add_chain(required)
                .await
                .map_err(|source| NetworkError::AddRejected {
                    network: required.chain_name,
                    source,
                })?;
            Ok(NetworkOutcome::Added { from: current })
        }
        Err(err) => Err(NetworkError::Switch(err)),
    }
}
