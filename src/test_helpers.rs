use crate::{
    contract::{
        Address,
        CallRequest,
        LATEST_ETH_USDT_PRICE_FN,
        PRICE_ORACLE_FN,
        encode_address_word,
        encode_u128_word,
        selector,
    },
    network::NetworkDescriptor,
    rpc::RpcError,
    wallet::WalletProvider,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

/// Every request the mock wallet received, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletCall {
    Accounts,
    RequestAccounts,
    ChainId,
    SwitchChain(String),
    AddChain(String),
    Call {
        to: Address,
        selector: Option<[u8; 4]>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    chain_id: String,
    authorized: Vec<String>,
    grant: Vec<String>,
    chain_error: Option<RpcError>,
    switch_error: Option<RpcError>,
    add_error: Option<RpcError>,
    request_error: Option<RpcError>,
    call_responses: HashMap<(Address, [u8; 4]), Result<Vec<u8>, RpcError>>,
    calls: Vec<WalletCall>,
}

/// Scripted in-memory wallet. Clones share state, so a test can keep one
/// handle while the code under test owns another.
#[derive(Clone, Debug, Default)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
}

impl MockWallet {
    pub fn on_chain(chain_id: &str) -> Self {
        let wallet = Self::default();
        wallet.set_chain_id(chain_id);
        wallet
    }

    /// Accounts handed out by `eth_requestAccounts`.
    pub fn granting(self, accounts: &[&str]) -> Self {
        self.lock().grant = to_strings(accounts);
        self
    }

    /// Accounts already authorized before any request.
    pub fn with_authorized(self, accounts: &[&str]) -> Self {
        self.set_authorized(accounts);
        self
    }

    pub fn failing_chain_query(self, err: RpcError) -> Self {
        self.lock().chain_error = Some(err);
        self
    }

    pub fn failing_switch(self, err: RpcError) -> Self {
        self.set_switch_error(Some(err));
        self
    }

    pub fn failing_add(self, err: RpcError) -> Self {
        self.lock().add_error = Some(err);
        self
    }

    pub fn rejecting_accounts(self, err: RpcError) -> Self {
        self.lock().request_error = Some(err);
        self
    }

    /// Platform at `platform` points at an oracle at `oracle` reporting `raw`.
    pub fn with_price_feed(self, platform: Address, oracle: Address, raw: u128) -> Self {
        self.respond(platform, PRICE_ORACLE_FN, Ok(encode_address_word(&oracle)));
        self.respond(oracle, LATEST_ETH_USDT_PRICE_FN, Ok(encode_u128_word(raw)));
        self
    }

    pub fn respond(
        &self,
        to: Address,
        signature: &str,
        response: Result<Vec<u8>, RpcError>,
    ) {
        self.lock()
            .call_responses
            .insert((to, selector(signature)), response);
    }

    pub fn set_chain_id(&self, chain_id: &str) {
        self.lock().chain_id = chain_id.to_string();
    }

    pub fn set_switch_error(&self, err: Option<RpcError>) {
        self.lock().switch_error = err;
    }

    pub fn set_authorized(&self, accounts: &[&str]) {
        self.lock().authorized = to_strings(accounts);
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&WalletCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn reads_of(&self, signature: &str) -> usize {
        let wanted = Some(selector(signature));
        self.count_calls(|c| matches!(c, WalletCall::Call { selector, .. } if *selector == wanted))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock wallet state poisoned")
    }
}

fn to_strings(accounts: &[&str]) -> Vec<String> {
    accounts.iter().map(|a| a.to_string()).collect()
}

impl WalletProvider for MockWallet {
    async fn accounts(&self) -> Result<Vec<String>, RpcError> {
        let mut state = self.lock();
        state.calls.push(WalletCall::Accounts);
        Ok(state.authorized.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<String>, RpcError> {
        let mut state = self.lock();
        state.calls.push(WalletCall::RequestAccounts);
        if let Some(err) = state.request_error.clone() {
            return Err(err);
        }
        if !state.grant.is_empty() {
            state.authorized = state.grant.clone();
        }
        Ok(state.authorized.clone())
    }

    async fn chain_id(&self) -> Result<String, RpcError> {
        let mut state = self.lock();
        state.calls.push(WalletCall::ChainId);
        match state.chain_error.clone() {
            Some(err) => Err(err),
            None => Ok(state.chain_id.clone()),
        }
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), RpcError> {
        let mut state = self.lock();
        state.calls.push(WalletCall::SwitchChain(chain_id.to_string()));
        if let Some(err) = state.switch_error.clone() {
            return Err(err);
        }
        state.chain_id = chain_id.to_string();
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), RpcError> {
        let mut state = self.lock();
        state.calls.push(WalletCall::AddChain(network.chain_id.to_string()));
        if let Some(err) = state.add_error.clone() {
            return Err(err);
        }
        state.chain_id = network.chain_id.to_string();
        Ok(())
    }

    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, RpcError> {
        let mut state = self.lock();
        let selector = request.selector();
        state.calls.push(WalletCall::Call {
            to: request.to,
            selector,
        });
        selector
            .and_then(|s| state.call_responses.get(&(request.to, s)).cloned())
            .unwrap_or_else(|| Err(RpcError::rpc(-32000, "execution reverted")))
    }
}
