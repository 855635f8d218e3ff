// Pulse Wallet Engine — Session manager
//
// `WalletClient` owns at most one `Session`. `connect` builds a session in
// full before it becomes visible; `send`, `refresh_balance` and the spend
// listener only ever read it. An account or chain change from the provider
// drops the session and every task hanging off it, and the caller has to
// connect again.
//
// Every public operation reports its outcome through the `WalletView` watch
// channel as well as its return value.

use super::advisory::AdvisoryClient;
use super::contract::{Erc20Binding, TokenContract, TransferNotification};
use super::events::NotificationPoller;
use super::history::{TransferHistory, TransferRecord};
use super::naming::NoNameProvider;
use super::network::ensure_chain;
use super::primitives::{Address, TokenAmount};
use super::provider::{ProviderHandle, WalletDiscovery, WalletProvider};
use super::rpc::eth_request_accounts;
use super::selector::select_provider;
use super::spending::{SpendTracker, SpendUpdate};
use super::transfer::{execute_transfer, TokenInfo};
use crate::atoms::error::{ProviderError, WalletError, WalletResult};
use crate::atoms::types::{ConnectionStatus, ProviderEvent, SpendSignal, WalletKind};
use crate::engine::config::WalletConfig;
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

// ── Observable view ────────────────────────────────────────────────────────

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletView {
    pub connection: ConnectionStatus,
    pub account: Option<String>,
    /// Human-unit token balance of the active account.
    pub balance: Option<String>,
    pub status_message: String,
    pub busy: bool,
    pub suggestion: Option<String>,
    pub spend_total: f64,
    pub spend_signal: Option<SpendSignal>,
    /// Rendered history lines, oldest first.
    pub history: Vec<String>,
}

// ── Session ────────────────────────────────────────────────────────────────

struct Session {
    id: Uuid,
    account: Address,
    chain_id: u64,
    provider: Arc<NoNameProvider<ProviderHandle>>,
    contract: Arc<dyn TokenContract>,
    history: TransferHistory,
    spend: SpendTracker,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Read-only facts about the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: Uuid,
    pub account: Address,
    pub chain_id: u64,
    pub contract: Address,
    pub provider: String,
}

// ── Guards ─────────────────────────────────────────────────────────────────

/// Holds a single-flight flag for the duration of an operation.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool, busy: WalletError) -> WalletResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard(flag))
            .map_err(|_| busy)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps `WalletView::busy` raised while at least one guard is alive.
struct BusyGuard<'a>(&'a ClientInner);

impl<'a> BusyGuard<'a> {
    fn acquire(inner: &'a ClientInner) -> Self {
        if inner.busy.fetch_add(1, Ordering::AcqRel) == 0 {
            inner.view.send_modify(|v| v.busy = true);
        }
        BusyGuard(inner)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.0.busy.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.view.send_modify(|v| v.busy = false);
        }
    }
}

// ── Client ─────────────────────────────────────────────────────────────────

struct ClientInner {
    config: WalletConfig,
    token: TokenInfo,
    discovery: Arc<dyn WalletDiscovery>,
    advisory: AdvisoryClient,
    session: Mutex<Option<Session>>,
    connecting: AtomicBool,
    sending: AtomicBool,
    busy: AtomicUsize,
    view: watch::Sender<WalletView>,
}

/// Cheaply cloneable handle; all clones share one session.
#[derive(Clone)]
pub struct WalletClient {
    inner: Arc<ClientInner>,
}

impl WalletClient {
    pub fn new(config: WalletConfig, discovery: Arc<dyn WalletDiscovery>) -> WalletResult<Self> {
        let advisory = AdvisoryClient::new(config.advisory_url.clone())?;
        Ok(Self::with_advisory(config, discovery, advisory))
    }

    pub fn with_advisory(config: WalletConfig, discovery: Arc<dyn WalletDiscovery>, advisory: AdvisoryClient) -> Self {
        let token = TokenInfo { symbol: config.token_symbol.clone(), decimals: config.token_decimals };
        let (view, _) = watch::channel(WalletView::default());
        Self {
            inner: Arc::new(ClientInner {
                config,
                token,
                discovery,
                advisory,
                session: Mutex::new(None),
                connecting: AtomicBool::new(false),
                sending: AtomicBool::new(false),
                busy: AtomicUsize::new(0),
                view,
            }),
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.inner.config
    }

    pub fn subscribe_view(&self) -> watch::Receiver<WalletView> {
        self.inner.view.subscribe()
    }

    pub fn view(&self) -> WalletView {
        self.inner.view.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.lock().is_some()
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.inner.session.lock().as_ref().map(|s| SessionInfo {
            id: s.id,
            account: s.account,
            chain_id: s.chain_id,
            contract: *s.contract.address(),
            provider: s.provider.name().to_string(),
        })
    }

    /// Confirmed transfers of the current session, oldest first.
    pub fn history(&self) -> Vec<TransferRecord> {
        self.inner
            .session
            .lock()
            .as_ref()
            .map(|s| s.history.records())
            .unwrap_or_default()
    }

    pub fn spend_total(&self) -> Option<f64> {
        self.inner.session.lock().as_ref().map(|s| s.spend.total())
    }

    /// Select a wallet, put it on the configured chain, authorize an
    /// account, bind the token contract and start the listeners.
    pub async fn connect(&self, kind: WalletKind) -> WalletResult<Address> {
        let _flight = match FlightGuard::try_acquire(&self.inner.connecting, WalletError::ConnectInProgress) {
            Ok(g) => g,
            Err(e) => return self.inner.fail(e),
        };
        // The live session's status line stays as it is.
        if self.is_connected() {
            return Err(WalletError::AlreadyConnected);
        }
        let _busy = BusyGuard::acquire(&self.inner);
        self.inner.view.send_modify(|v| {
            v.connection = ConnectionStatus::Connecting;
            v.status_message = format!("Connecting to {}...", kind);
        });

        let (session, listeners) = match self.establish(kind).await {
            Ok(built) => built,
            Err(e) => {
                error!("[wallet] Connect via {} failed: {}", kind, e);
                self.inner.view.send_modify(|v| v.connection = ConnectionStatus::Disconnected);
                return self.inner.fail(e);
            }
        };

        let (id, account, contract) = (session.id, session.account, session.contract.clone());
        info!("[wallet] Session {} connected as {} on chain {}", id, account, session.chain_id);
        {
            // Listeners must not run before their session is reachable.
            let mut guard = self.inner.session.lock();
            let session = guard.insert(session);
            self.inner.view.send_modify(|v| {
                *v = WalletView {
                    connection: ConnectionStatus::Connected,
                    account: Some(account.to_checksum()),
                    status_message: format!("Connected: {}", account.short()),
                    busy: v.busy,
                    ..WalletView::default()
                };
            });
            session.tasks = listeners.start(Arc::downgrade(&self.inner), id);
        }

        if let Err(e) = self.inner.load_balance(id, &*contract).await {
            warn!("[wallet] Initial balance read failed: {}", e);
        }
        Ok(account)
    }

    async fn establish(&self, kind: WalletKind) -> WalletResult<(Session, Listeners)> {
        let config = &self.inner.config;

        let env = self.inner.discovery.discover();
        let candidate = select_provider(&env, kind)?;
        let provider = Arc::new(NoNameProvider::new(candidate.handle));

        let outcome = ensure_chain(&*provider, &config.chain).await?;
        info!("[network] {:?} on {}", outcome, config.chain.chain_name);

        let accounts = eth_request_accounts(&*provider).await?;
        let first = accounts
            .first()
            .ok_or_else(|| ProviderError::new(ProviderError::UNAUTHORIZED, "wallet returned no accounts"))?;
        let account: Address = first.parse().map_err(|_| WalletError::InvalidAddress(first.clone()))?;

        let token_address: Address = config
            .token_address
            .parse()
            .map_err(|_| WalletError::InvalidAddress(format!("token contract {}", config.token_address)))?;
        let contract: Arc<dyn TokenContract> = Arc::new(Erc20Binding::new(
            provider.clone(),
            token_address,
            account,
            &config.notification_event,
            config.receipt_poll(),
        ));

        let mut poller = NotificationPoller::new(contract.clone(), config.event_poll());
        let start = poller.start_at_head().await?;
        info!("[spend] Following notifications from block {}", start);
        let listeners = Listeners { poller, provider_events: provider.subscribe() };

        let session = Session {
            id: Uuid::new_v4(),
            account,
            chain_id: config.chain.chain_id,
            provider,
            contract,
            history: TransferHistory::new(config.history_capacity),
            spend: SpendTracker::new(account, config.token_decimals, config.spend_threshold),
            tasks: Vec::new(),
        };
        Ok((session, listeners))
    }

    /// Transfer `amount` (human units) to `recipient` and wait for inclusion.
    pub async fn send(&self, recipient: &str, amount: &str) -> WalletResult<TransferRecord> {
        let (session_id, contract) = match self.inner.snapshot() {
            Some(s) => s,
            None => return self.inner.fail(WalletError::NotConnected),
        };
        let _flight = match FlightGuard::try_acquire(&self.inner.sending, WalletError::SendInProgress) {
            Ok(g) => g,
            Err(e) => return self.inner.fail(e),
        };
        let _busy = BusyGuard::acquire(&self.inner);
        self.inner.set_status(format!("Sending {} {}...", amount.trim(), self.inner.token.symbol));

        let record = match execute_transfer(&*contract, recipient, amount, &self.inner.token).await {
            Ok(r) => r,
            Err(e) => {
                error!("[wallet] Transfer failed: {}", e);
                return self.inner.fail(e);
            }
        };

        let line = record.display_line(&self.inner.token.symbol);
        {
            let mut guard = self.inner.session.lock();
            match guard.as_mut() {
                Some(s) if s.id == session_id => {
                    s.history.push(record.clone());
                    let lines: Vec<String> = s
                        .history
                        .records()
                        .iter()
                        .map(|r| r.display_line(&self.inner.token.symbol))
                        .collect();
                    self.inner.view.send_modify(|v| v.history = lines);
                }
                _ => warn!("[wallet] Session ended while {} was confirming", record.tx_hash),
            }
        }
        self.inner.set_status(line);

        if let Err(e) = self.inner.load_balance(session_id, &*contract).await {
            warn!("[wallet] Balance refresh after send failed: {}", e);
        }
        Ok(record)
    }

    /// Re-read the active account's token balance and publish it.
    pub async fn refresh_balance(&self) -> WalletResult<TokenAmount> {
        let (session_id, contract) = match self.inner.snapshot() {
            Some(s) => s,
            None => return self.inner.fail(WalletError::NotConnected),
        };
        let _busy = BusyGuard::acquire(&self.inner);
        match self.inner.load_balance(session_id, &*contract).await {
            Ok(balance) => Ok(balance),
            Err(e) => self.inner.fail(e),
        }
    }

    /// Ask the advisory service about `total_spent` and publish the answer.
    /// Never fails; service errors become the fallback text.
    pub async fn request_advice(&self, total_spent: f64) -> String {
        let _busy = BusyGuard::acquire(&self.inner);
        let suggestion = self.inner.advisory.request_advice(total_spent).await;
        self.inner.view.send_modify(|v| v.suggestion = Some(suggestion.clone()));
        suggestion
    }

    /// Drop the session and all of its listeners.
    pub fn disconnect(&self) {
        if let Some(session) = self.inner.session.lock().take() {
            info!("[wallet] Session {} disconnected", session.id);
        }
        self.inner.reset_view(ConnectionStatus::Disconnected, "Disconnected".into());
    }
}

impl ClientInner {
    fn snapshot(&self) -> Option<(Uuid, Arc<dyn TokenContract>)> {
        self.session.lock().as_ref().map(|s| (s.id, s.contract.clone()))
    }

    fn is_current(&self, id: Uuid) -> bool {
        self.session.lock().as_ref().is_some_and(|s| s.id == id)
    }

    /// Read the signer's balance; publish it only while session `id` is live.
    async fn load_balance(&self, id: Uuid, contract: &dyn TokenContract) -> WalletResult<TokenAmount> {
        let balance = contract.balance_of(contract.signer()).await?;
        let guard = self.session.lock();
        if guard.as_ref().is_some_and(|s| s.id == id) {
            let human = balance.to_human(self.token.decimals);
            self.view.send_modify(|v| v.balance = Some(human));
        }
        Ok(balance)
    }

    fn set_status(&self, message: String) {
        self.view.send_modify(|v| v.status_message = message);
    }

    /// Publish `err` as the status line and hand it back.
    fn fail<T>(&self, err: WalletError) -> WalletResult<T> {
        self.set_status(err.to_string());
        Err(err)
    }

    fn reset_view(&self, connection: ConnectionStatus, status_message: String) {
        self.view.send_modify(|v| {
            *v = WalletView { connection, status_message, busy: v.busy, ..WalletView::default() };
        });
    }

    /// Tear down session `id` if it is still the active one.
    fn invalidate(&self, id: Uuid, reason: &str) {
        let dropped = {
            let mut guard = self.session.lock();
            match guard.as_ref() {
                Some(s) if s.id == id => guard.take(),
                _ => None,
            }
        };
        if dropped.is_some() {
            warn!("[wallet] Session {} invalidated: {}", id, reason);
            self.reset_view(ConnectionStatus::Invalidated, format!("{}. Please reconnect.", reason));
        }
        // `dropped` goes out of scope here and aborts the session's tasks,
        // including the caller's.
    }

    /// Fold one notification into the spend total. Returns the update when
    /// the event belonged to session `id` and was new.
    fn apply_notification(&self, id: Uuid, event: &TransferNotification) -> Option<SpendUpdate> {
        let update = {
            let mut guard = self.session.lock();
            let session = guard.as_mut().filter(|s| s.id == id)?;
            session.spend.observe(event)?
        };
        self.view.send_modify(|v| {
            v.spend_total = update.total;
            v.spend_signal = Some(update.signal);
        });
        Some(update)
    }
}

/// Receivers opened while a session is built; spawned once it is stored.
struct Listeners {
    poller: NotificationPoller,
    provider_events: broadcast::Receiver<ProviderEvent>,
}

impl Listeners {
    fn start(self, client: Weak<ClientInner>, id: Uuid) -> Vec<JoinHandle<()>> {
        let (tx, rx) = mpsc::channel(64);
        vec![
            self.poller.spawn(tx),
            tokio::spawn(spend_consumer(client.clone(), id, rx)),
            tokio::spawn(lifecycle_listener(client, id, self.provider_events)),
        ]
    }
}

async fn spend_consumer(client: Weak<ClientInner>, id: Uuid, mut rx: mpsc::Receiver<TransferNotification>) {
    while let Some(event) = rx.recv().await {
        let Some(inner) = client.upgrade() else { return };
        let Some(update) = inner.apply_notification(id, &event) else { continue };
        let suggestion = inner.advisory.request_advice(update.total).await;
        if inner.is_current(id) {
            inner.view.send_modify(|v| v.suggestion = Some(suggestion));
        }
    }
}

async fn lifecycle_listener(client: Weak<ClientInner>, id: Uuid, mut events: broadcast::Receiver<ProviderEvent>) {
    let reason = loop {
        match events.recv().await {
            Ok(ProviderEvent::AccountsChanged(accounts)) => {
                info!("[wallet] accountsChanged → {:?}", accounts);
                break "Wallet account changed";
            }
            Ok(ProviderEvent::ChainChanged(chain)) => {
                info!("[wallet] chainChanged → {}", chain);
                break "Wallet network changed";
            }
            // Missed events may include a change; treat it as one.
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("[wallet] Missed {} provider event(s)", n);
                break "Wallet state changed";
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    };
    if let Some(inner) = client.upgrade() {
        inner.invalidate(id, reason);
    }
}
