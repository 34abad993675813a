use crate::{
    contract::{
        ContractError,
        PlatformContract,
        PriceOracle,
    },
    price::PriceSample,
    wallet::WalletProvider,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::{
    info,
    warn,
};

pub const DEFAULT_PRICE_INTERVAL: Duration = Duration::from_secs(60);

/// Reads the oracle address from the platform, then the oracle's price.
pub async fn fetch_price<W: WalletProvider>(
    platform: &PlatformContract<W>,
) -> Result<PriceSample, ContractError> {
    let oracle_address = platform.price_oracle().await?;
    let oracle = PriceOracle::new(platform.wallet().clone(), oracle_address);
    let raw = oracle.latest_eth_usdt_price().await?;
    Ok(PriceSample::new(raw))
}

/// Background price refresh bound to one session. Dropping the poller
/// cancels its task.
#[derive(Debug)]
pub struct PricePoller {
    handle: JoinHandle<()>,
}

impl PricePoller {
    /// Fetches once right away and then every `period`.
    pub fn spawn<W, M>(
        platform: PlatformContract<W>,
        period: Duration,
        sink: mpsc::UnboundedSender<M>,
    ) -> Self
    where
        W: WalletProvider,
        M: From<PriceSample> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            info!(platform = %platform.address(), ?period, "price poller started");
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch_price(&platform).await {
                    Ok(sample) => {
                        info!(price = %sample, "fetched ETH/USDT price");
                        if sink.send(sample.into()).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "fetching ETH/USDT price failed"),
                }
            }
        });
        Self { handle }
    }

    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PricePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
