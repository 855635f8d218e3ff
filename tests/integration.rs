// End-to-end flows against a scripted in-memory wallet.

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_wallet::{
    select_provider, AdvisoryClient, Address, ConnectionStatus, InjectedEnvironment, ProviderError, ProviderEvent,
    ProviderHandle, SpendSignal, WalletCandidate, WalletClient, WalletConfig, WalletError, WalletKind,
    WalletProvider, ADVISORY_FALLBACK,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
const TOKEN: &str = "0x2222222222222222222222222222222222222222";
const RECIPIENT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
const SEPOLIA_HEX: &str = "0xaa36a7";
const ONE: u128 = 1_000_000_000_000_000_000;

/// Wallet whose chain, balance and logs the test controls. Every request is
/// recorded by method name.
struct ScriptedWallet {
    name: String,
    chain: Mutex<String>,
    knows_target: Mutex<bool>,
    balance: Mutex<u128>,
    head: Mutex<u64>,
    logs: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl ScriptedWallet {
    fn on_chain(chain: &str) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            name: "scripted".into(),
            chain: Mutex::new(chain.into()),
            knows_target: Mutex::new(true),
            balance: Mutex::new(10 * ONE),
            head: Mutex::new(100),
            logs: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            events,
        })
    }

    fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|m| *m == method).count()
    }

    /// Append one notification log in a new block.
    fn emit_notification(&self, sender: &str, whole_tokens: u128) {
        let mut head = self.head.lock();
        *head += 1;
        let sender_hex = sender.trim_start_matches("0x").to_lowercase();
        let data = format!("0x{:0>64}{:064x}{:064x}", sender_hex, whole_tokens * ONE, *head);
        self.logs.lock().push(json!({
            "data": data,
            "blockNumber": format!("0x{:x}", *head),
            "logIndex": "0x0",
            "transactionHash": format!("0x{:064x}", *head),
        }));
    }
}

fn quantity(v: &str) -> u64 {
    u64::from_str_radix(v.trim_start_matches("0x"), 16).unwrap()
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().push(method.to_string());
        match method {
            "eth_chainId" => Ok(json!(self.chain.lock().clone())),
            "wallet_switchEthereumChain" => {
                if !*self.knows_target.lock() {
                    return Err(ProviderError::new(ProviderError::UNRECOGNIZED_CHAIN, "Unrecognized chain ID"));
                }
                *self.chain.lock() = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                *self.knows_target.lock() = true;
                *self.chain.lock() = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                Ok(Value::Null)
            }
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([ACCOUNT])),
            "eth_call" => Ok(json!(format!("0x{:064x}", *self.balance.lock()))),
            "eth_sendTransaction" => Ok(json!(format!("0x{:064x}", 0xbeefu64))),
            "eth_getTransactionReceipt" => Ok(json!({ "blockNumber": "0x65", "status": "0x1" })),
            "eth_blockNumber" => Ok(json!(format!("0x{:x}", *self.head.lock()))),
            "eth_getLogs" => {
                let from = quantity(params[0]["fromBlock"].as_str().unwrap_or("0x0"));
                let to = quantity(params[0]["toBlock"].as_str().unwrap_or("0x0"));
                let logs: Vec<Value> = self
                    .logs
                    .lock()
                    .iter()
                    .filter(|l| {
                        let b = quantity(l["blockNumber"].as_str().unwrap_or("0x0"));
                        b >= from && b <= to
                    })
                    .cloned()
                    .collect();
                Ok(json!(logs))
            }
            other => Err(ProviderError::new(ProviderError::UNSUPPORTED_METHOD, other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

fn test_config() -> WalletConfig {
    WalletConfig {
        token_address: TOKEN.into(),
        receipt_poll_ms: 5,
        event_poll_ms: 10,
        ..WalletConfig::default()
    }
}

fn client_for(wallet: &Arc<ScriptedWallet>) -> WalletClient {
    let handle: ProviderHandle = wallet.clone();
    let env = InjectedEnvironment::single(WalletCandidate::new(handle).metamask());
    let advisory = AdvisoryClient::new("http://127.0.0.1:1/analyze").unwrap();
    WalletClient::with_advisory(test_config(), Arc::new(env), advisory)
}

// ── Scenario A: brand selection ────────────────────────────────────────────

#[test]
fn requested_brand_yields_that_candidate() {
    let brave = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let coinbase = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let metamask = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let handle = |w: &Arc<ScriptedWallet>| -> ProviderHandle { w.clone() };
    let env = InjectedEnvironment::many(vec![
        WalletCandidate::new(handle(&brave)).metamask().brave(),
        WalletCandidate::new(handle(&coinbase)).metamask().coinbase(),
        WalletCandidate::new(handle(&metamask)).metamask(),
    ]);

    let picked = select_provider(&env, WalletKind::MetaMask).unwrap();
    assert_eq!(Arc::as_ptr(&picked.handle) as *const (), Arc::as_ptr(&metamask) as *const ());
    assert!(picked.is_metamask && !picked.is_coinbase_wallet && !picked.is_brave_wallet);

    let only_brave = InjectedEnvironment::single(WalletCandidate::new(handle(&brave)).brave().metamask());
    assert!(matches!(
        select_provider(&only_brave, WalletKind::MetaMask),
        Err(WalletError::WalletNotFound(WalletKind::MetaMask))
    ));
    assert!(matches!(
        select_provider(&InjectedEnvironment::default(), WalletKind::Auto),
        Err(WalletError::NoWalletDetected)
    ));
}

// ── Scenario B: already on the required chain ──────────────────────────────

#[tokio::test]
async fn connect_on_required_chain_skips_switching() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    let account = client.connect(WalletKind::MetaMask).await.unwrap();

    assert_eq!(account.to_checksum(), ACCOUNT);
    assert_eq!(wallet.calls_to("wallet_switchEthereumChain"), 0);
    assert_eq!(wallet.calls_to("wallet_addEthereumChain"), 0);
    assert_eq!(wallet.calls_to("eth_requestAccounts"), 1);
    let info = client.session_info().unwrap();
    assert_eq!(info.chain_id, 11_155_111);
    assert_eq!(info.contract.to_checksum(), TOKEN);
    assert_eq!(client.view().connection, ConnectionStatus::Connected);
}

#[tokio::test]
async fn known_chain_is_switched_to() {
    let wallet = ScriptedWallet::on_chain("0x1");
    let client = client_for(&wallet);
    client.connect(WalletKind::Auto).await.unwrap();
    assert_eq!(wallet.calls_to("wallet_switchEthereumChain"), 1);
    assert_eq!(wallet.calls_to("wallet_addEthereumChain"), 0);
    assert_eq!(*wallet.chain.lock(), SEPOLIA_HEX);
}

#[tokio::test]
async fn unknown_chain_is_added_then_activated() {
    let wallet = ScriptedWallet::on_chain("0x1");
    *wallet.knows_target.lock() = false;
    let client = client_for(&wallet);
    client.connect(WalletKind::Auto).await.unwrap();
    assert_eq!(wallet.calls_to("wallet_addEthereumChain"), 1);
    assert_eq!(wallet.chain.lock().as_str(), SEPOLIA_HEX);
}

// ── Scenario C: send and confirm ───────────────────────────────────────────

#[tokio::test]
async fn send_records_transfer_and_refreshes_balance() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    client.connect(WalletKind::MetaMask).await.unwrap();
    let balance_reads_before = wallet.calls_to("eth_call");

    let record = client.send(RECIPIENT, "5").await.unwrap();
    assert_eq!(record.recipient.to_checksum(), RECIPIENT);
    assert_eq!(record.amount, "5");

    let history = client.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, "5");
    assert_eq!(wallet.calls_to("eth_sendTransaction"), 1);
    // One balanceOf for the precondition, one for the refresh.
    assert_eq!(wallet.calls_to("eth_call") - balance_reads_before, 2);

    let view = client.view();
    assert_eq!(view.history, vec!["Sent 5 WPU to 0xd8dA...6045".to_string()]);
    assert_eq!(view.status_message, "Sent 5 WPU to 0xd8dA...6045");
    assert!(!view.busy);
}

#[tokio::test]
async fn rejected_sends_never_reach_the_wallet() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    client.connect(WalletKind::MetaMask).await.unwrap();

    assert!(matches!(client.send("0x12", "1").await, Err(WalletError::InvalidAddress(_))));
    assert!(matches!(client.send(RECIPIENT, "0").await, Err(WalletError::InvalidAmount(_))));
    assert!(matches!(client.send(RECIPIENT, "-1").await, Err(WalletError::InvalidAmount(_))));
    assert!(matches!(
        client.send(RECIPIENT, "11").await,
        Err(WalletError::InsufficientBalance { .. })
    ));
    assert_eq!(wallet.calls_to("eth_sendTransaction"), 0);
    assert!(client.history().is_empty());
    assert!(client.view().status_message.starts_with("Insufficient WPU balance"));
}

#[tokio::test]
async fn history_keeps_the_last_five() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    client.connect(WalletKind::MetaMask).await.unwrap();
    for n in 1..=6 {
        client.send(RECIPIENT, &n.to_string()).await.unwrap();
    }
    let amounts: Vec<String> = client.history().into_iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec!["2", "3", "4", "5", "6"]);
}

// ── Scenario D: advisory outage ────────────────────────────────────────────

#[tokio::test]
async fn advisory_outage_yields_fallback() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    assert_eq!(client.request_advice(12.5).await, ADVISORY_FALLBACK);
    assert_eq!(client.view().suggestion.as_deref(), Some(ADVISORY_FALLBACK));
}

// ── Spend tracking and teardown ────────────────────────────────────────────

#[tokio::test]
async fn own_notifications_accumulate_spend() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    client.connect(WalletKind::MetaMask).await.unwrap();
    let mut view = client.subscribe_view();

    wallet.emit_notification(ACCOUNT, 4);
    wallet.emit_notification(RECIPIENT, 100);
    wallet.emit_notification(ACCOUNT, 7);

    let settled = tokio::time::timeout(
        Duration::from_secs(5),
        view.wait_for(|v| v.spend_total >= 11.0 && v.suggestion.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(settled.spend_total, 11.0);
    assert_eq!(settled.spend_signal, Some(SpendSignal::Cautionary));
    assert_eq!(client.spend_total(), Some(11.0));
}

#[tokio::test]
async fn chain_change_invalidates_and_allows_reconnect() {
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let client = client_for(&wallet);
    client.connect(WalletKind::MetaMask).await.unwrap();
    client.send(RECIPIENT, "1").await.unwrap();

    let mut view = client.subscribe_view();
    wallet.events.send(ProviderEvent::ChainChanged("0x1".into())).unwrap();
    tokio::time::timeout(
        Duration::from_secs(2),
        view.wait_for(|v| v.connection == ConnectionStatus::Invalidated),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(!client.is_connected());
    assert!(matches!(client.send(RECIPIENT, "1").await, Err(WalletError::NotConnected)));

    client.connect(WalletKind::MetaMask).await.unwrap();
    assert!(client.history().is_empty());
    assert_eq!(client.spend_total(), Some(0.0));
}

#[tokio::test]
async fn literal_addresses_only() {
    use pulse_wallet::{NameResolver, NoNameProvider};
    let wallet = ScriptedWallet::on_chain(SEPOLIA_HEX);
    let handle: ProviderHandle = wallet.clone();
    let naming = NoNameProvider::new(handle);

    let addr: Address = RECIPIENT.parse().unwrap();
    assert_eq!(naming.resolve_name(RECIPIENT).await.unwrap(), RECIPIENT);
    let lower = RECIPIENT.to_lowercase();
    assert_eq!(naming.resolve_name(&lower).await.unwrap(), lower);
    assert!(matches!(
        naming.resolve_name("vitalik.eth").await,
        Err(WalletError::UnsupportedResolution(name)) if name == "vitalik.eth"
    ));
    assert_eq!(naming.lookup_address(&addr).await.unwrap(), None);
    assert!(wallet.calls.lock().is_empty());
}
