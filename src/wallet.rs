use crate::{
    contract::CallRequest,
    network::NetworkDescriptor,
    rpc::{
        RpcClient,
        RpcError,
    },
};
use serde_json::json;
use std::{
    future::Future,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::{
    debug,
    warn,
};

/// The wallet capability: account access, network management and relayed
/// read calls, in the shape of an EIP-1193 provider.
pub trait WalletProvider: Clone + Send + Sync + 'static {
    /// Accounts already authorized for this client (`eth_accounts`).
    fn accounts(&self) -> impl Future<Output = Result<Vec<String>, RpcError>> + Send;

    /// Prompts the user for account access (`eth_requestAccounts`).
    fn request_accounts(&self)
    -> impl Future<Output = Result<Vec<String>, RpcError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<String, RpcError>> + Send;

    fn switch_chain(
        &self,
        chain_id: &str,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    fn add_chain(
        &self,
        network: &NetworkDescriptor,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    fn call(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<Vec<u8>, RpcError>> + Send;
}

/// Wallet reached through a local JSON-RPC bridge.
#[derive(Clone, Debug)]
pub struct HttpWallet {
    rpc: RpcClient,
}

impl HttpWallet {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::new(url)?,
        })
    }

    pub fn url(&self) -> &str {
        self.rpc.url()
    }
}

impl WalletProvider for HttpWallet {
    async fn accounts(&self) -> Result<Vec<String>, RpcError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<String>, RpcError> {
        self.rpc.request("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<String, RpcError> {
        self.rpc.request("eth_chainId", json!([])).await
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), RpcError> {
        self.rpc
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), RpcError> {
        self.rpc
            .request("wallet_addEthereumChain", json!([network]))
            .await
    }

    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, RpcError> {
        let mut tx = json!({
            "to": request.to.to_string(),
            "data": format!("0x{}", hex::encode(&request.data)),
        });
        if let Some(from) = request.from {
            tx["from"] = json!(from.to_string());
        }
        let out: String = self.rpc.request("eth_call", json!([tx, "latest"])).await?;
        decode_hex(&out)
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, RpcError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| RpcError::Decode(format!("eth_call result: {e}")))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

/// Standing `accountsChanged` / `chainChanged` subscription. The watch task is
/// aborted when this handle is dropped.
#[derive(Debug)]
pub struct EventWatcher {
    handle: JoinHandle<()>,
}

impl EventWatcher {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for EventWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Polls the wallet every `period` and reports account and network changes.
/// The first poll only records a baseline.
pub fn spawn_event_watcher<W, M>(
    wallet: W,
    period: Duration,
    sink: mpsc::UnboundedSender<M>,
) -> EventWatcher
where
    W: WalletProvider,
    M: From<WalletEvent> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_accounts: Option<Vec<String>> = None;
        let mut last_chain: Option<String> = None;
        loop {
            ticker.tick().await;
            match wallet.accounts().await {
                Ok(accounts) => {
                    if let Some(previous) = &last_accounts
                        && *previous != accounts
                    {
                        debug!(?accounts, "wallet accounts changed");
                        if sink
                            .send(WalletEvent::AccountsChanged(accounts.clone()).into())
                            .is_err()
                        {
                            break;
                        }
                    }
                    last_accounts = Some(accounts);
                }
                Err(err) => warn!(%err, "polling wallet accounts failed"),
            }
            match wallet.chain_id().await {
                Ok(chain) => {
                    if let Some(previous) = &last_chain
                        && !previous.eq_ignore_ascii_case(&chain)
                    {
                        debug!(%chain, "wallet network changed");
                        if sink
                            .send(WalletEvent::ChainChanged(chain.clone()).into())
                            .is_err()
                        {
                            break;
                        }
                    }
                    last_chain = Some(chain);
                }
                Err(err) => warn!(%err, "polling wallet network failed"),
            }
        }
    });
    EventWatcher { handle }
}
