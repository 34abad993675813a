use crate::{
    ALICE,
    BOB,
    EVENT_POLL,
    ORACLE,
    PLATFORM,
    PRICE_POLL,
    addr,
    controller,
    run_pending,
    settle,
};
use microcredit_dapp::{
    client::AppController,
    contract::LATEST_ETH_USDT_PRICE_FN,
    router::{
        Screen,
        View,
    },
    rpc::{
        RpcError,
        USER_REJECTED_REQUEST,
    },
    session::Role,
    state::Msg,
    test_helpers::{
        MockWallet,
        WalletCall,
    },
    wallet::{
        WalletEvent,
        spawn_event_watcher,
    },
};
use tokio::{
    sync::mpsc,
    time,
};

fn wallet() -> MockWallet {
    MockWallet::on_chain("0xaa36a7")
        .granting(&[ALICE])
        .with_price_feed(addr(PLATFORM), addr(ORACLE), 300_000_000_000)
}

async fn connected(wallet: &MockWallet) -> AppController<MockWallet> {
    let mut controller = controller(Some(wallet.clone()));
    controller.request_connect();
    settle(&mut controller).await;
    assert!(controller.state().session.is_some());
    controller
}

#[tokio::test(start_paused = true)]
async fn watcher__emits_only_changes_after_the_baseline() {
    // given
    let wallet = MockWallet::on_chain("0xaa36a7").with_authorized(&[ALICE]);
    let (tx, mut rx) = mpsc::unbounded_channel::<WalletEvent>();
    let _watcher = spawn_event_watcher(wallet.clone(), EVENT_POLL, tx);
    run_pending().await;

    // when
    time::advance(EVENT_POLL).await;
    run_pending().await;
    let quiet = rx.try_recv();
    wallet.set_authorized(&[BOB]);
    wallet.set_chain_id("0x1");
    time::advance(EVENT_POLL).await;
    run_pending().await;

    // then
    assert!(quiet.is_err());
    assert_eq!(
        rx.try_recv().unwrap(),
        WalletEvent::AccountsChanged(vec![BOB.to_string()])
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        WalletEvent::ChainChanged("0x1".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn price__when_connected__then_sample_lands_in_state() {
    let wallet = wallet();
    let controller = connected(&wallet).await;
    let price = controller.state().price.unwrap();
    assert_eq!(price.to_string(), "3000.00000000");
}

#[tokio::test(start_paused = true)]
async fn accounts_emptied__when_on_dashboard__then_session_cleared_and_poller_stopped() {
    // given
    let wallet = wallet();
    let mut controller = connected(&wallet).await;
    controller.dispatch(Msg::SelectRole(Role::Admin));
    assert_eq!(controller.state().screen(), Screen::AdminDashboard);
    let reads = wallet.reads_of(LATEST_ETH_USDT_PRICE_FN);

    // when
    wallet.set_authorized(&[]);
    time::advance(EVENT_POLL).await;
    settle(&mut controller).await;
    time::advance(PRICE_POLL * 3).await;
    settle(&mut controller).await;

    // then
    let state = controller.state();
    assert!(state.session.is_none());
    assert!(state.price.is_none());
    assert_eq!(state.view, View::Landing);
    assert_eq!(state.screen(), Screen::Disconnected);
    assert!(!controller.poller_running());
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), reads);
    assert_eq!(
        state.notifications.iter().last().unwrap().title,
        "Wallet disconnected"
    );
}

#[tokio::test(start_paused = true)]
async fn accounts_switched__then_session_follows_new_account() {
    // given
    let wallet = wallet();
    let mut controller = connected(&wallet).await;

    // when
    wallet.set_authorized(&[BOB]);
    time::advance(EVENT_POLL).await;
    settle(&mut controller).await;

    // then
    let session = controller.state().session.as_ref().unwrap();
    assert_eq!(session.account, addr(BOB));
    assert_eq!(session.contract.sender(), addr(BOB));
    assert!(controller.poller_running());
}

#[tokio::test(start_paused = true)]
async fn chain_changed__when_wrong_network__then_reload_keeps_only_notifications() {
    // given
    let wallet = wallet();
    let mut controller = connected(&wallet).await;
    controller.dispatch(Msg::Navigate(View::Application));
    wallet.set_switch_error(Some(RpcError::rpc(
        USER_REJECTED_REQUEST,
        "User rejected the request.",
    )));

    // when
    wallet.set_chain_id("0x1");
    time::advance(EVENT_POLL).await;
    settle(&mut controller).await;

    // then
    let state = controller.state();
    let titles: Vec<&str> = state.notifications.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Wallet connected", "Wrong network", "Connection error"]
    );
    assert!(state.session.is_none());
    assert!(state.price.is_none());
    assert_eq!(state.view, View::Landing);
    assert!(!controller.poller_running());
    assert!(!controller.watcher_running());
}

#[tokio::test(start_paused = true)]
async fn chain_changed__when_account_still_authorized__then_reconnects_after_reload() {
    // given
    let wallet = wallet();
    let mut controller = connected(&wallet).await;
    let switches_before = wallet.count_calls(|c| matches!(c, WalletCall::SwitchChain(_)));

    // when
    wallet.set_chain_id("0x1");
    time::advance(EVENT_POLL).await;
    settle(&mut controller).await;

    // then
    assert!(controller.state().session.is_some());
    assert!(controller.watcher_running());
    assert!(controller.poller_running());
    assert_eq!(
        wallet.count_calls(|c| matches!(c, WalletCall::SwitchChain(_))),
        switches_before + 1
    );
}
