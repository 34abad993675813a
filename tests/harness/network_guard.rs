use crate::{
    ALICE,
    platform,
};
use microcredit_dapp::{
    contract::Address,
    network::{
        NetworkError,
        NetworkOutcome,
        SEPOLIA,
        ensure_network,
    },
    rpc::{
        RpcError,
        UNRECOGNIZED_CHAIN,
        USER_REJECTED_REQUEST,
    },
    session::{
        ConnectError,
        connect,
    },
    test_helpers::{
        MockWallet,
        WalletCall,
    },
};
use proptest::prelude::*;

#[tokio::test]
async fn ensure_network__when_already_on_sepolia__then_no_switch_request() {
    // given
    let wallet = MockWallet::on_chain("0xAA36A7");

    // when
    let outcome = ensure_network(&wallet, &SEPOLIA).await.unwrap();

    // then
    assert_eq!(outcome, NetworkOutcome::AlreadyOnNetwork);
    assert_eq!(wallet.calls(), vec![WalletCall::ChainId]);
}

#[tokio::test]
async fn ensure_network__when_on_other_chain__then_switches_once() {
    // given
    let wallet = MockWallet::on_chain("0x1");

    // when
    let outcome = ensure_network(&wallet, &SEPOLIA).await.unwrap();

    // then
    assert_eq!(
        outcome,
        NetworkOutcome::Switched {
            from: "0x1".to_string()
        }
    );
    assert_eq!(
        wallet.calls(),
        vec![
            WalletCall::ChainId,
            WalletCall::SwitchChain("0xaa36a7".to_string()),
        ]
    );
}

#[tokio::test]
async fn ensure_network__when_switch_rejected__then_error_carries_wallet_message() {
    // given
    let wallet = MockWallet::on_chain("0x1").failing_switch(RpcError::rpc(
        USER_REJECTED_REQUEST,
        "User rejected the request.",
    ));

    // when
    let err = ensure_network(&wallet, &SEPOLIA).await.unwrap_err();

    // then
    assert!(matches!(err, NetworkError::Switch(_)));
    assert_eq!(err.to_string(), "User rejected the request.");
    assert_eq!(
        wallet.count_calls(|c| matches!(c, WalletCall::SwitchChain(_))),
        1
    );
    assert_eq!(wallet.count_calls(|c| matches!(c, WalletCall::AddChain(_))), 0);
}

#[tokio::test]
async fn ensure_network__when_add_is_rejected__then_asks_for_manual_setup() {
    // given
    let wallet = MockWallet::on_chain("0x1")
        .failing_switch(RpcError::rpc(UNRECOGNIZED_CHAIN, "Unrecognized chain ID"))
        .failing_add(RpcError::rpc(USER_REJECTED_REQUEST, "User rejected the request."));

    // when
    let err = ensure_network(&wallet, &SEPOLIA).await.unwrap_err();

    // then
    assert!(matches!(err, NetworkError::AddRejected { .. }));
    assert!(err.to_string().contains("manually"));
}

#[tokio::test]
async fn ensure_network__when_chain_query_fails__then_nothing_else_is_requested() {
    let wallet = MockWallet::on_chain("0x1")
        .failing_chain_query(RpcError::Transport("connection refused".to_string()));
    let err = ensure_network(&wallet, &SEPOLIA).await.unwrap_err();
    assert!(matches!(err, NetworkError::ChainQuery(_)));
    assert_eq!(wallet.calls(), vec![WalletCall::ChainId]);
}

#[tokio::test]
async fn connect__when_chain_unknown_to_wallet__then_adds_it_and_authorizes() {
    // given
    let wallet = MockWallet::on_chain("0x1")
        .failing_switch(RpcError::rpc(UNRECOGNIZED_CHAIN, "Unrecognized chain ID"))
        .granting(&[ALICE]);

    // when
    let connected = connect(Some(&wallet), &platform()).await.unwrap();

    // then
    assert_eq!(
        connected.network,
        NetworkOutcome::Added {
            from: "0x1".to_string()
        }
    );
    assert_eq!(
        wallet.calls(),
        vec![
            WalletCall::ChainId,
            WalletCall::SwitchChain("0xaa36a7".to_string()),
            WalletCall::AddChain("0xaa36a7".to_string()),
            WalletCall::RequestAccounts,
        ]
    );
    let alice: Address = ALICE.parse().unwrap();
    assert_eq!(connected.account, alice);
    assert_eq!(connected.contract.sender(), alice);
    assert_eq!(connected.account.short(), "0x1111...1111");
}

#[tokio::test]
async fn connect__when_network_guard_fails__then_accounts_are_never_requested() {
    let wallet = MockWallet::on_chain("0x1")
        .failing_switch(RpcError::rpc(-32603, "internal error"))
        .granting(&[ALICE]);
    let err = connect(Some(&wallet), &platform()).await.unwrap_err();
    assert!(matches!(err, ConnectError::Network(NetworkError::Switch(_))));
    assert_eq!(
        wallet.count_calls(|c| matches!(c, WalletCall::RequestAccounts)),
        0
    );
}

fn other_chain_id() -> impl Strategy<Value = String> {
    (1u64..=u64::MAX)
        .prop_filter("must differ from Sepolia", |id| *id != 0xaa36a7)
        .prop_map(|id| format!("{id:#x}"))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    #[test]
    fn connect__from_any_other_chain__then_exactly_one_switch_before_authorization(
        chain_id in other_chain_id()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let wallet = MockWallet::on_chain(&chain_id).granting(&[ALICE]);

        let result = runtime.block_on(connect(Some(&wallet), &platform()));

        prop_assert!(result.is_ok());
        let calls = wallet.calls();
        let switches: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, WalletCall::SwitchChain(_)))
            .map(|(i, _)| i)
            .collect();
        let authorization = calls
            .iter()
            .position(|c| matches!(c, WalletCall::RequestAccounts));
        prop_assert_eq!(switches.len(), 1);
        prop_assert!(authorization.is_some_and(|a| switches[0] < a));
    }
}
