// Pulse Wallet Engine — Injected Provider Interface
// The EIP-1193 surface every wallet backend implements, the naming seam the
// resolution policy overrides, and the per-connect candidate snapshot.

use super::primitives::Address;
use crate::atoms::error::{ProviderError, WalletResult};
use crate::atoms::types::ProviderEvent;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// An injected wallet provider: one `request` entry point plus lifecycle
/// notifications.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Short label for logs ("metamask@http://127.0.0.1:8545", "mock", …).
    fn name(&self) -> &str;

    /// `provider.request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// `provider.on("accountsChanged" | "chainChanged", …)`.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Human-readable name ↔ address directory operations.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// The resolved address as the directory spells it.
    async fn resolve_name(&self, name: &str) -> WalletResult<String>;
    async fn lookup_address(&self, address: &Address) -> WalletResult<Option<String>>;
}

/// Shared handle to a type-erased provider.
pub type ProviderHandle = Arc<dyn WalletProvider>;

#[async_trait]
impl<P: WalletProvider + ?Sized> WalletProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        (**self).request(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        (**self).subscribe()
    }
}

// ── Candidate snapshot ─────────────────────────────────────────────────────

/// One injected provider as the environment exposes it, with the brand flags
/// it claims about itself.
#[derive(Clone)]
pub struct WalletCandidate {
    pub is_metamask: bool,
    pub is_coinbase_wallet: bool,
    pub is_brave_wallet: bool,
    pub handle: ProviderHandle,
}

impl WalletCandidate {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { is_metamask: false, is_coinbase_wallet: false, is_brave_wallet: false, handle }
    }

    pub fn metamask(mut self) -> Self {
        self.is_metamask = true;
        self
    }

    pub fn coinbase(mut self) -> Self {
        self.is_coinbase_wallet = true;
        self
    }

    pub fn brave(mut self) -> Self {
        self.is_brave_wallet = true;
        self
    }
}

impl fmt::Debug for WalletCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCandidate")
            .field("name", &self.handle.name())
            .field("is_metamask", &self.is_metamask)
            .field("is_coinbase_wallet", &self.is_coinbase_wallet)
            .field("is_brave_wallet", &self.is_brave_wallet)
            .finish()
    }
}

/// What the host environment exposes: `window.ethereum.providers` when
/// several wallets are installed, and `window.ethereum` itself.
#[derive(Debug, Clone, Default)]
pub struct InjectedEnvironment {
    pub providers: Vec<WalletCandidate>,
    pub default: Option<WalletCandidate>,
}

impl InjectedEnvironment {
    /// Environment with a single implicit provider and no provider list.
    pub fn single(candidate: WalletCandidate) -> Self {
        Self { providers: Vec::new(), default: Some(candidate) }
    }

    /// Environment exposing several providers; the first doubles as the
    /// implicit default, as browsers do.
    pub fn many(providers: Vec<WalletCandidate>) -> Self {
        let default = providers.first().cloned();
        Self { providers, default }
    }

    /// `window.ethereum?.providers || (window.ethereum ? [window.ethereum] : [])`
    pub fn candidates(&self) -> Vec<WalletCandidate> {
        if !self.providers.is_empty() {
            self.providers.clone()
        } else {
            self.default.iter().cloned().collect()
        }
    }
}

/// Source of a fresh environment snapshot for each connect attempt.
pub trait WalletDiscovery: Send + Sync {
    fn discover(&self) -> InjectedEnvironment;
}

impl WalletDiscovery for InjectedEnvironment {
    fn discover(&self) -> InjectedEnvironment {
        self.clone()
    }
}
