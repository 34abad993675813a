use crate::{
    ALICE,
    ORACLE,
    PLATFORM,
    PRICE_POLL,
    addr,
    controller,
    platform,
    settle,
};
use microcredit_dapp::{
    contract::LATEST_ETH_USDT_PRICE_FN,
    notify::Severity,
    router::Screen,
    rpc::{
        RpcError,
        USER_REJECTED_REQUEST,
    },
    session::{
        ConnectError,
        WALLET_INSTALL_URL,
        connect,
    },
    state::Msg,
    test_helpers::{
        MockWallet,
        WalletCall,
    },
    wallet::WalletEvent,
};
use std::time::Duration;
use tokio::time;

#[tokio::test]
async fn connect__when_no_wallet__then_no_wallet_error() {
    let err = connect::<MockWallet>(None, &platform()).await.unwrap_err();
    assert_eq!(err, ConnectError::NoWallet);
    assert!(err.to_string().contains(WALLET_INSTALL_URL));
}

#[tokio::test]
async fn connect__when_authorization_rejected__then_no_partial_session() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").rejecting_accounts(RpcError::rpc(
        USER_REJECTED_REQUEST,
        "User rejected the request.",
    ));

    // when
    let err = connect(Some(&wallet), &platform()).await.unwrap_err();

    // then
    assert!(matches!(err, ConnectError::Authorization(_)));
    assert_eq!(err.to_string(), "User rejected the request.");
    assert_eq!(
        wallet.calls(),
        vec![WalletCall::ChainId, WalletCall::RequestAccounts]
    );
}

#[tokio::test]
async fn connect__when_wallet_grants_nothing__then_no_accounts_error() {
    let wallet = MockWallet::on_chain("0xaa36a7");
    let err = connect(Some(&wallet), &platform()).await.unwrap_err();
    assert_eq!(err, ConnectError::NoAccounts);
}

#[tokio::test]
async fn request_connect__when_authorization_rejected__then_error_toast_and_no_session() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").rejecting_accounts(RpcError::rpc(
        USER_REJECTED_REQUEST,
        "User rejected the request.",
    ));
    let mut controller = controller(Some(wallet));

    // when
    controller.request_connect();
    settle(&mut controller).await;

    // then
    let state = controller.state();
    assert!(state.session.is_none());
    assert_eq!(state.screen(), Screen::Disconnected);
    assert!(!controller.poller_running());
    assert!(!controller.watcher_running());
    let toast = state.notifications.last().unwrap();
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.title, "Connection error");
    assert_eq!(toast.body, "User rejected the request.");
}

#[tokio::test]
async fn request_connect__when_no_wallet__then_install_guidance() {
    // given
    let mut controller = controller(None);

    // when
    controller.request_connect();
    settle(&mut controller).await;

    // then
    let toast = controller.state().notifications.last().unwrap();
    assert_eq!(toast.severity, Severity::Warning);
    assert_eq!(toast.duration, Duration::from_secs(10));
    assert!(controller.state().session.is_none());
}

#[tokio::test]
async fn request_connect__when_successful__then_user_session_with_background_tasks() {
    // given
    let wallet = MockWallet::on_chain("0x1").granting(&[ALICE]);
    let mut controller = controller(Some(wallet.clone()));

    // when
    controller.request_connect();
    settle(&mut controller).await;

    // then
    let state = controller.state();
    assert_eq!(state.account().unwrap().to_string(), ALICE);
    assert_eq!(state.screen(), Screen::Landing);
    assert_eq!(state.chain_id.as_deref(), Some("0xaa36a7"));
    assert!(controller.poller_running());
    assert!(controller.watcher_running());
    assert_eq!(state.notifications.last().unwrap().title, "Wallet connected");
}

#[tokio::test]
async fn request_connect__when_repeated__then_single_watcher_and_single_attempt() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").granting(&[ALICE]);
    let mut controller = controller(Some(wallet.clone()));

    // when
    controller.request_connect();
    controller.request_connect();
    settle(&mut controller).await;
    controller.request_connect();
    settle(&mut controller).await;

    // then
    assert_eq!(
        wallet.count_calls(|c| matches!(c, WalletCall::RequestAccounts)),
        2
    );
    assert!(controller.watcher_running());
    assert!(controller.state().session.is_some());
}

#[tokio::test]
async fn startup__when_account_already_authorized__then_connects_automatically() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").with_authorized(&[ALICE]);
    let mut controller = controller(Some(wallet.clone()));

    // when
    controller.startup();
    settle(&mut controller).await;

    // then
    assert!(controller.state().session.is_some());
    assert_eq!(wallet.calls()[0], WalletCall::Accounts);
}

#[tokio::test]
async fn startup__when_nothing_authorized__then_waits_for_the_user() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").granting(&[ALICE]);
    let mut controller = controller(Some(wallet.clone()));

    // when
    controller.startup();
    settle(&mut controller).await;

    // then
    assert!(controller.state().session.is_none());
    assert!(!controller.state().is_connecting());
    assert!(controller.state().notifications.is_empty());
    assert_eq!(wallet.calls(), vec![WalletCall::Accounts]);
}

#[tokio::test(start_paused = true)]
async fn request_connect__when_repeated__then_replaced_poller_stops_reading() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7")
        .granting(&[ALICE])
        .with_price_feed(addr(PLATFORM), addr(ORACLE), 300_000_000_000);
    let mut controller = controller(Some(wallet.clone()));
    controller.request_connect();
    settle(&mut controller).await;
    controller.request_connect();
    settle(&mut controller).await;
    let after_connects = wallet.reads_of(LATEST_ETH_USDT_PRICE_FN);

    // when
    time::advance(PRICE_POLL).await;
    settle(&mut controller).await;
    let after_first_tick = wallet.reads_of(LATEST_ETH_USDT_PRICE_FN);
    time::advance(PRICE_POLL).await;
    settle(&mut controller).await;

    // then
    assert_eq!(after_connects, 2);
    assert_eq!(after_first_tick, after_connects + 1);
    assert_eq!(
        wallet.reads_of(LATEST_ETH_USDT_PRICE_FN),
        after_connects + 2
    );
    assert!(controller.poller_running());
}

#[tokio::test]
async fn reload__when_connect_is_pending__then_pending_attempt_never_reaches_the_wallet() {
    // given
    let wallet = MockWallet::on_chain("0x1").granting(&[ALICE]);
    let mut controller = controller(Some(wallet.clone()));
    controller.request_connect();

    // when
    controller.dispatch(Msg::Wallet(WalletEvent::ChainChanged("0x5".to_string())));
    settle(&mut controller).await;

    // then
    assert_eq!(wallet.calls(), vec![WalletCall::Accounts]);
    assert!(controller.state().session.is_none());
    assert!(!controller.state().is_connecting());

    controller.request_connect();
    settle(&mut controller).await;
    assert_eq!(
        wallet.count_calls(|c| matches!(c, WalletCall::RequestAccounts)),
        1
    );
    assert!(controller.state().session.is_some());
}
