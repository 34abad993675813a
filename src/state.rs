use crate::{
    application::{
        ApplicationAction,
        GroupApplication,
    },
    contract::Address,
    network::NetworkDescriptor,
    notify::{
        Notification,
        Notifications,
    },
    price::PriceSample,
    router::{
        self,
        Screen,
        View,
    },
    session::{
        ConnectError,
        Connected,
        Role,
        Session,
        WALLET_INSTALL_URL,
    },
    wallet::WalletEvent,
};
use std::time::Duration;
use tracing::{
    debug,
    info,
    warn,
};

/// Everything that can change the application state. Messages are applied
/// one at a time, in arrival order.
#[derive(Debug)]
pub enum Msg<W> {
    ConnectFinished {
        attempt: u64,
        result: Result<Connected<W>, ConnectError>,
    },
    /// The startup probe found no authorized account.
    ConnectSkipped { attempt: u64 },
    Wallet(WalletEvent),
    PriceFetched(PriceSample),
    Navigate(View),
    SelectRole(Role),
    Application(ApplicationAction),
}

impl<W> From<WalletEvent> for Msg<W> {
    fn from(event: WalletEvent) -> Self {
        Msg::Wallet(event)
    }
}

impl<W> From<PriceSample> for Msg<W> {
    fn from(sample: PriceSample) -> Self {
        Msg::PriceFetched(sample)
    }
}

/// Work the controller performs after a state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    StartPoller,
    StopPoller,
    Subscribe,
    Reload,
}

#[derive(Debug)]
pub struct AppState<W> {
    pub session: Option<Session<W>>,
    pub chain_id: Option<String>,
    pub view: View,
    pub price: Option<PriceSample>,
    pub notifications: Notifications,
    pub application: GroupApplication,
    required: NetworkDescriptor,
    next_attempt: u64,
    in_flight: Option<u64>,
}

impl<W: crate::wallet::WalletProvider> AppState<W> {
    pub fn new(required: NetworkDescriptor) -> Self {
        Self {
            session: None,
            chain_id: None,
            view: View::Landing,
            price: None,
            notifications: Notifications::default(),
            application: GroupApplication::default(),
            required,
            next_attempt: 0,
            in_flight: None,
        }
    }

    pub fn required_network(&self) -> &NetworkDescriptor {
        &self.required
    }

    pub fn screen(&self) -> Screen {
        router::route(
            self.session.is_some(),
            self.view,
            self.session.as_ref().map(|s| s.role),
        )
    }

    pub fn account(&self) -> Option<Address> {
        self.session.as_ref().map(|s| s.account)
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|s| s.role)
    }

    pub fn is_connecting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Reserves a connect attempt, or `None` while one is still running.
    pub fn begin_connect(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_attempt += 1;
        self.in_flight = Some(self.next_attempt);
        Some(self.next_attempt)
    }

    /// Back to the initial state. Toasts survive so the reason for the reload
    /// stays visible; in-flight connects become stale.
    pub fn reload(&mut self) {
        let notifications = std::mem::take(&mut self.notifications);
        let next_attempt = self.next_attempt;
        *self = Self::new(self.required);
        self.notifications = notifications;
        self.next_attempt = next_attempt;
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn update(&mut self, msg: Msg<W>) -> Vec<Effect> {
        match msg {
            Msg::ConnectFinished { attempt, result } => {
                self.on_connect_finished(attempt, result)
            }
            Msg::ConnectSkipped { attempt } => {
                if self.in_flight == Some(attempt) {
                    self.in_flight = None;
                }
                Vec::new()
            }
            Msg::Wallet(WalletEvent::AccountsChanged(accounts)) => {
                self.on_accounts_changed(accounts)
            }
            Msg::Wallet(WalletEvent::ChainChanged(chain_id)) => {
                self.on_chain_changed(chain_id)
            }
            Msg::PriceFetched(sample) => {
                if self.session.is_some() {
                    self.price = Some(sample);
                } else {
                    debug!("discarding price sample without a session");
                }
                Vec::new()
            }
            Msg::Navigate(view) => {
                if self.session.is_some() {
                    self.view = view;
                } else {
                    debug!(?view, "ignoring navigation without a session");
                }
                Vec::new()
            }
            Msg::SelectRole(role) => {
                self.on_select_role(role);
                Vec::new()
            }
            Msg::Application(action) => {
                if self.session.is_none() {
                    debug!(?action, "ignoring application action without a session");
                    return Vec::new();
                }
                if let Some(toast) = self.application.apply(action) {
                    self.notify(toast);
                }
                Vec::new()
            }
        }
    }

    fn on_connect_finished(
        &mut self,
        attempt: u64,
        result: Result<Connected<W>, ConnectError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(attempt) {
            debug!(attempt, "discarding stale connect result");
            return Vec::new();
        }
        self.in_flight = None;
        match result {
            Ok(connected) => {
                info!(account = %connected.account, network = ?connected.network, "wallet connected");
                self.notify(Notification::success(
                    "Wallet connected",
                    format!("Connected to {}", connected.account.short()),
                ));
                self.session = Some(Session {
                    account: connected.account,
                    contract: connected.contract,
                    role: Role::User,
                });
                self.chain_id = Some(connected.chain_id);
                vec![Effect::Subscribe, Effect::StartPoller]
            }
            Err(ConnectError::NoWallet) => {
                self.notify(
                    Notification::warning(
                        "No wallet detected",
                        format!(
                            "Install a wallet and try again: {WALLET_INSTALL_URL}"
                        ),
                    )
                    .lasting(Duration::from_secs(10)),
                );
                Vec::new()
            }
            Err(err) => {
                self.notify(Notification::error("Connection error", err.to_string()));
                Vec::new()
            }
        }
    }

    fn on_accounts_changed(&mut self, accounts: Vec<String>) -> Vec<Effect> {
        let Some(first) = accounts.first() else {
            return self.disconnect(Notification::info(
                "Wallet disconnected",
                "Your wallet connection was closed",
            ));
        };
        let account: Address = match first.parse() {
            Ok(account) => account,
            Err(err) => {
                warn!(%err, account = %first, "wallet reported an unreadable account");
                return self.disconnect(Notification::warning(
                    "Wallet disconnected",
                    format!("Unreadable account reported by the wallet: {first}"),
                ));
            }
        };
        let Some(session) = self.session.as_mut() else {
            debug!(%account, "ignoring account change without a session");
            return Vec::new();
        };
        session.account = account;
        session.contract = session.contract.with_sender(account);
        self.notify(Notification::info(
            "Account switched",
            format!("Current account: {}", account.short()),
        ));
        Vec::new()
    }

    fn on_chain_changed(&mut self, chain_id: String) -> Vec<Effect> {
        if !self.required.matches(&chain_id) {
            self.notify(Notification::error(
                "Wrong network",
                format!("Please switch to the {}", self.required.chain_name),
            ));
        }
        warn!(%chain_id, "wallet network changed, reloading");
        self.chain_id = Some(chain_id);
        vec![Effect::Reload]
    }

    fn on_select_role(&mut self, role: Role) {
        let Some(session) = self.session.as_mut() else {
            debug!(?role, "ignoring role selection without a session");
            return;
        };
        session.role = role;
        self.view = View::Dashboard;
        let title = match role {
            Role::Admin => "Switched to admin mode",
            Role::User => "Switched to user mode",
        };
        self.notify(Notification::success(title, "").lasting(Duration::from_secs(2)));
    }

    /// Drops the session along with everything tied to it. The toast is
    /// only raised when there was a session to lose.
    fn disconnect(&mut self, notification: Notification) -> Vec<Effect> {
        self.price = None;
        self.application = GroupApplication::default();
        self.view = View::Landing;
        if self.session.take().is_some() {
            self.notify(notification);
        }
        vec![Effect::StopPoller]
    }
}
