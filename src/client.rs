use crate::{
    config::AppConfig,
    poller::PricePoller,
    session::{
        self,
        PlatformConfig,
    },
    state::{
        AppState,
        Effect,
        Msg,
    },
    ui,
    wallet::{
        self,
        EventWatcher,
        HttpWallet,
        WalletProvider,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    fmt::Debug,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time,
};
use tracing::{
    debug,
    info,
    warn,
};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
pub struct ControllerConfig {
    pub platform: PlatformConfig,
    pub price_interval: Duration,
    pub event_poll_interval: Duration,
}

impl From<&AppConfig> for ControllerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            platform: config.platform,
            price_interval: config.price_interval,
            event_poll_interval: config.event_poll_interval,
        }
    }
}

/// Owns the state container, the message queue feeding it, and the
/// background tasks its effects start and stop.
pub struct AppController<W: WalletProvider> {
    config: ControllerConfig,
    wallet: Option<W>,
    state: AppState<W>,
    msg_tx: mpsc::UnboundedSender<Msg<W>>,
    msg_rx: mpsc::UnboundedReceiver<Msg<W>>,
    poller: Option<PricePoller>,
    watcher: Option<EventWatcher>,
    connect_task: Option<JoinHandle<()>>,
}

impl<W: WalletProvider + Debug> AppController<W> {
    pub fn new(config: ControllerConfig, wallet: Option<W>) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(config.platform.network),
            config,
            wallet,
            msg_tx,
            msg_rx,
            poller: None,
            watcher: None,
            connect_task: None,
        }
    }

    pub fn state(&self) -> &AppState<W> {
        &self.state
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn poller_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn watcher_running(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Connects automatically when the wallet already lists an authorized
    /// account; otherwise leaves the user to press connect.
    pub fn startup(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            info!("no wallet configured, waiting for the user");
            return;
        };
        let Some(attempt) = self.state.begin_connect() else {
            return;
        };
        let platform = self.config.platform;
        let tx = self.msg_tx.clone();
        self.connect_task = Some(tokio::spawn(async move {
            let msg = match wallet.accounts().await {
                Ok(accounts) if !accounts.is_empty() => {
                    info!("wallet already authorized, connecting");
                    let result = session::connect(Some(&wallet), &platform).await;
                    Msg::ConnectFinished { attempt, result }
                }
                Ok(_) => Msg::ConnectSkipped { attempt },
                Err(err) => {
                    warn!(%err, "checking authorized accounts failed");
                    Msg::ConnectSkipped { attempt }
                }
            };
            let _ = tx.send(msg);
        }));
    }

    /// User-initiated connect. Ignored while another attempt is running.
    pub fn request_connect(&mut self) {
        let Some(attempt) = self.state.begin_connect() else {
            debug!("connect already in progress");
            return;
        };
        let wallet = self.wallet.clone();
        let platform = self.config.platform;
        let tx = self.msg_tx.clone();
        self.connect_task = Some(tokio::spawn(async move {
            let result = session::connect(wallet.as_ref(), &platform).await;
            let _ = tx.send(Msg::ConnectFinished { attempt, result });
        }));
    }

    pub async fn next_msg(&mut self) -> Option<Msg<W>> {
        self.msg_rx.recv().await
    }

    /// Applies every message already queued, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    pub fn dispatch(&mut self, msg: Msg<W>) {
        for effect in self.state.update(msg) {
            self.apply(effect);
        }
    }

    pub fn expire_notifications(&mut self) -> bool {
        self.state.notifications.expire(chrono::Utc::now())
    }

    pub fn shutdown(&mut self) {
        self.cancel_connect();
        self.poller = None;
        self.watcher = None;
        info!("background tasks stopped");
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartPoller => {
                let Some(session) = self.state.session.as_ref() else {
                    return;
                };
                self.poller = Some(PricePoller::spawn(
                    session.contract.clone(),
                    self.config.price_interval,
                    self.msg_tx.clone(),
                ));
            }
            Effect::StopPoller => {
                if self.poller.take().is_some() {
                    info!("price poller stopped");
                }
            }
            Effect::Subscribe => {
                if self.watcher.is_some() {
                    return;
                }
                if let Some(wallet) = self.wallet.clone() {
                    info!("subscribing to wallet events");
                    self.watcher = Some(wallet::spawn_event_watcher(
                        wallet,
                        self.config.event_poll_interval,
                        self.msg_tx.clone(),
                    ));
                }
            }
            Effect::Reload => self.reload(),
        }
    }

    fn cancel_connect(&mut self) {
        if let Some(task) = self.connect_task.take()
            && !task.is_finished()
        {
            task.abort();
            info!("pending connect attempt cancelled");
        }
    }

    fn reload(&mut self) {
        warn!("reloading after wallet network change");
        self.cancel_connect();
        self.poller = None;
        self.watcher = None;
        self.state.reload();
        self.startup();
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let wallet = match &config.wallet_url {
        Some(url) => {
            info!(%url, "using wallet bridge");
            Some(HttpWallet::new(url.clone()).wrap_err("Failed to set up wallet client")?)
        }
        None => {
            warn!("no wallet bridge configured");
            None
        }
    };
    let mut controller = AppController::new(ControllerConfig::from(&config), wallet);
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    info!("starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    controller.shutdown();
    res
}

async fn run_loop<W: WalletProvider + Debug>(
    controller: &mut AppController<W>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    controller.startup();
    let mut ticker = time::interval(REDRAW_INTERVAL);
    ui::draw(ui_state, controller.state()).wrap_err("initial draw failed")?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                controller.expire_notifications();
            }
            Some(msg) = controller.next_msg() => controller.dispatch(msg),
            raw = input_events.recv() => {
                let event = raw
                    .ok_or_else(|| eyre!("terminal input stream closed"))?
                    .wrap_err("reading terminal input failed")?;
                match ui::interpret_event(ui_state, controller.state(), event) {
                    Some(ui::UserEvent::Quit) => break,
                    Some(ui::UserEvent::Connect) => controller.request_connect(),
                    Some(ui::UserEvent::Navigate(view)) => controller.dispatch(Msg::Navigate(view)),
                    Some(ui::UserEvent::SelectRole(role)) => controller.dispatch(Msg::SelectRole(role)),
                    Some(ui::UserEvent::Application(action)) => {
                        controller.dispatch(Msg::Application(action))
                    }
                    Some(ui::UserEvent::Redraw) | None => {}
                }
            }
        }
        ui::draw(ui_state, controller.state()).wrap_err("draw failed")?;
    }
    Ok(())
}
