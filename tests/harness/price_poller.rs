use crate::{
    ALICE,
    ORACLE,
    PLATFORM,
    addr,
    run_pending,
};
use microcredit_dapp::{
    contract::{
        LATEST_ETH_USDT_PRICE_FN,
        PRICE_ORACLE_FN,
        PlatformContract,
    },
    poller::{
        DEFAULT_PRICE_INTERVAL,
        PricePoller,
        fetch_price,
    },
    price::PriceSample,
    rpc::RpcError,
    test_helpers::MockWallet,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time,
};

fn platform_with_price(raw: u128) -> (MockWallet, PlatformContract<MockWallet>) {
    let wallet =
        MockWallet::on_chain("0xaa36a7").with_price_feed(addr(PLATFORM), addr(ORACLE), raw);
    let platform = PlatformContract::new(wallet.clone(), addr(PLATFORM), addr(ALICE));
    (wallet, platform)
}

#[tokio::test]
async fn fetch_price__reads_oracle_address_then_price() {
    // given
    let (wallet, platform) = platform_with_price(300_000_000_000);

    // when
    let sample = fetch_price(&platform).await.unwrap();

    // then
    assert_eq!(sample.raw, 300_000_000_000);
    assert_eq!(sample.to_string(), "3000.00000000");
    assert_eq!(wallet.reads_of(PRICE_ORACLE_FN), 1);
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 1);
}

#[tokio::test]
async fn fetch_price__when_oracle_reverts__then_error() {
    let (wallet, platform) = platform_with_price(1);
    wallet.respond(
        addr(ORACLE),
        LATEST_ETH_USDT_PRICE_FN,
        Err(RpcError::rpc(-32000, "execution reverted")),
    );
    assert!(fetch_price(&platform).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn spawn__reads_immediately_then_at_most_once_per_interval() {
    // given
    let (wallet, platform) = platform_with_price(300_000_000_000);
    let (tx, mut rx) = mpsc::unbounded_channel::<PriceSample>();

    // when
    let _poller = PricePoller::spawn(platform, DEFAULT_PRICE_INTERVAL, tx);
    run_pending().await;

    // then
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 1);
    assert_eq!(rx.try_recv().unwrap().to_string(), "3000.00000000");

    time::advance(Duration::from_secs(59)).await;
    run_pending().await;
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 1);

    time::advance(Duration::from_secs(1)).await;
    run_pending().await;
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 2);

    time::advance(Duration::from_secs(60)).await;
    run_pending().await;
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 3);
}

#[tokio::test(start_paused = true)]
async fn spawn__when_dropped__then_no_further_reads() {
    // given
    let (wallet, platform) = platform_with_price(300_000_000_000);
    let (tx, _rx) = mpsc::unbounded_channel::<PriceSample>();
    let poller = PricePoller::spawn(platform, DEFAULT_PRICE_INTERVAL, tx);
    run_pending().await;
    let before = wallet.reads_of(LATEST_ETH_USDT_PRICE_FN);

    // when
    poller.cancel();
    time::advance(Duration::from_secs(300)).await;
    run_pending().await;

    // then
    assert_eq!(before, 1);
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), before);
}

#[tokio::test(start_paused = true)]
async fn spawn__when_read_fails__then_nothing_is_published_and_polling_continues() {
    // given
    let (wallet, platform) = platform_with_price(1);
    wallet.respond(
        addr(PLATFORM),
        PRICE_ORACLE_FN,
        Err(RpcError::rpc(-32000, "execution reverted")),
    );
    let (tx, mut rx) = mpsc::unbounded_channel::<PriceSample>();

    // when
    let poller = PricePoller::spawn(platform, DEFAULT_PRICE_INTERVAL, tx);
    run_pending().await;
    time::advance(DEFAULT_PRICE_INTERVAL).await;
    run_pending().await;

    // then
    assert!(rx.try_recv().is_err());
    assert_eq!(wallet.reads_of(PRICE_ORACLE_FN), 2);
    assert_eq!(wallet.reads_of(LATEST_ETH_USDT_PRICE_FN), 0);
    assert!(!poller.is_finished());
}
