// engine/config.rs — Wallet configuration.
//
// Loaded from ~/.pulse-wallet/config.toml (or an explicit path); a missing
// file means "all defaults". Two environment variables override the values
// most often changed per deployment: PULSE_TOKEN_ADDRESS, PULSE_ADVISORY_URL.
//
// Example:
//   token_address = "0x…"
//   advisory_url  = "http://localhost:5000/analyze"
//
//   [chain]
//   chain_id = 11155111
//
//   [[wallets]]
//   name = "metamask"
//   rpc_url = "http://127.0.0.1:8545"
//   is_metamask = true

use crate::atoms::constants::*;
use crate::atoms::error::{WalletError, WalletResult};
use crate::atoms::types::ChainDescriptor;
use crate::engine::wallet::http_provider::JsonRpcProvider;
use crate::engine::wallet::provider::{InjectedEnvironment, WalletCandidate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One injected wallet exposed to the client, with the brand flags it claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub name: String,
    pub rpc_url: String,
    #[serde(default)]
    pub is_metamask: bool,
    #[serde(default)]
    pub is_coinbase_wallet: bool,
    #[serde(default)]
    pub is_brave_wallet: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub chain: ChainDescriptor,
    pub token_address: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    /// Solidity signature of the transfer-notification event.
    pub notification_event: String,
    pub advisory_url: String,
    pub spend_threshold: f64,
    pub history_capacity: usize,
    pub receipt_poll_ms: u64,
    pub event_poll_ms: u64,
    pub account_watch_ms: u64,
    pub wallets: Vec<WalletEntry>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain: ChainDescriptor::default(),
            token_address: DEFAULT_TOKEN_ADDRESS.into(),
            token_symbol: DEFAULT_TOKEN_SYMBOL.into(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            notification_event: DEFAULT_NOTIFICATION_EVENT.into(),
            advisory_url: DEFAULT_ADVISORY_URL.into(),
            spend_threshold: DEFAULT_SPEND_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            event_poll_ms: DEFAULT_EVENT_POLL_MS,
            account_watch_ms: DEFAULT_ACCOUNT_WATCH_MS,
            wallets: Vec::new(),
        }
    }
}

impl WalletConfig {
    /// `~/.pulse-wallet/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path` (or the default location), apply env overrides, validate.
    pub fn load(path: Option<&Path>) -> WalletResult<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(p) if p.exists() => {
                info!("[config] Loading {}", p.display());
                Self::from_toml(&std::fs::read_to_string(&p)?)?
            }
            Some(p) => {
                info!("[config] {} not found, using defaults", p.display());
                Self::default()
            }
            None => {
                warn!("[config] No home directory, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> WalletResult<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ENV_TOKEN_ADDRESS) {
            self.token_address = addr;
        }
        if let Ok(url) = std::env::var(ENV_ADVISORY_URL) {
            self.advisory_url = url;
        }
    }

    /// Structural checks only. The token address is checked at connect time.
    pub fn validate(&self) -> WalletResult<()> {
        if !self.spend_threshold.is_finite() || self.spend_threshold < 0.0 {
            return Err(WalletError::Config(format!("spend_threshold must be >= 0, got {}", self.spend_threshold)));
        }
        if self.history_capacity == 0 {
            return Err(WalletError::Config("history_capacity must be at least 1".into()));
        }
        if self.receipt_poll_ms == 0 || self.event_poll_ms == 0 || self.account_watch_ms == 0 {
            return Err(WalletError::Config("poll intervals must be non-zero".into()));
        }
        url::Url::parse(&self.advisory_url)
            .map_err(|e| WalletError::Config(format!("invalid advisory_url '{}': {}", self.advisory_url, e)))?;
        Ok(())
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    pub fn event_poll(&self) -> Duration {
        Duration::from_millis(self.event_poll_ms)
    }

    pub fn account_watch(&self) -> Duration {
        Duration::from_millis(self.account_watch_ms)
    }

    /// Build the injected environment from `[[wallets]]`. With `watch`, each
    /// provider also starts its account/chain watcher (needs a tokio runtime).
    pub fn injected_environment(&self, watch: bool) -> WalletResult<InjectedEnvironment> {
        let mut candidates = Vec::with_capacity(self.wallets.len());
        for entry in &self.wallets {
            let provider = Arc::new(JsonRpcProvider::new(entry.name.clone(), &entry.rpc_url)?);
            if watch {
                let _ = provider.watch_changes(self.account_watch());
            }
            candidates.push(WalletCandidate {
                is_metamask: entry.is_metamask,
                is_coinbase_wallet: entry.is_coinbase_wallet,
                is_brave_wallet: entry.is_brave_wallet,
                handle: provider,
            });
        }
        Ok(match candidates.len() {
            0 => InjectedEnvironment::default(),
            1 => InjectedEnvironment::single(candidates.remove(0)),
            _ => InjectedEnvironment::many(candidates),
        })
    }
}
