// Pulse Wallet Engine — HTTP JSON-RPC Provider
//
// A `WalletProvider` backed by a node's JSON-RPC endpoint, for headless use
// (CLI, dev nodes with unlocked accounts). There is no authorization prompt
// on a node, so `eth_requestAccounts` is served by `eth_accounts`; the node
// signs `eth_sendTransaction` itself.
//
// Account/chain change notifications are produced by `watch_changes`, which
// polls both and broadcasts on any difference from the first observation.

use super::provider::WalletProvider;
use super::rpc::{eth_accounts, eth_chain_id};
use crate::atoms::error::{ProviderError, WalletError, WalletResult};
use crate::atoms::types::ProviderEvent;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub struct JsonRpcProvider {
    name: String,
    rpc_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
}

impl JsonRpcProvider {
    pub fn new(name: impl Into<String>, rpc_url: &str) -> WalletResult<Self> {
        let parsed = url::Url::parse(rpc_url)
            .map_err(|e| WalletError::Config(format!("invalid rpc_url '{}': {}", rpc_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            name: name.into(),
            rpc_url: parsed.to_string(),
            client,
            next_id: AtomicU64::new(1),
            events,
        })
    }

    /// Low-level JSON-RPC call
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!("[rpc] {} → {} (id {})", self.name, method, id);

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::internal(format!("RPC transport: {}", e)))?;
        let result: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::internal(format!("RPC response: {}", e)))?;

        if let Some(error) = result.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(ProviderError::INTERNAL);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            return Err(ProviderError::new(code, message));
        }

        result
            .get("result")
            .cloned()
            .ok_or_else(|| ProviderError::internal("RPC response missing 'result' field"))
    }

    /// Poll accounts and chain id, broadcasting `AccountsChanged` /
    /// `ChainChanged` when either moves away from the last observed value.
    pub fn watch_changes(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            let mut last_accounts = eth_accounts(&*provider).await.ok();
            let mut last_chain = eth_chain_id(&*provider).await.ok();
            info!("[rpc] Watching {} for account/chain changes", provider.name);
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match eth_accounts(&*provider).await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                            let _ = provider.events.send(ProviderEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(e) => warn!("[rpc] Account watch on {} failed: {}", provider.name, e),
                }
                match eth_chain_id(&*provider).await {
                    Ok(chain) => {
                        if last_chain.is_some_and(|prev| prev != chain) {
                            let _ = provider.events.send(ProviderEvent::ChainChanged(format!("0x{:x}", chain)));
                        }
                        last_chain = Some(chain);
                    }
                    Err(e) => warn!("[rpc] Chain watch on {} failed: {}", provider.name, e),
                }
            }
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let method = if method == "eth_requestAccounts" { "eth_accounts" } else { method };
        self.rpc_call(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
