// ── Pulse Atoms: Plain Data Types ──────────────────────────────────────────
// Enumerations and descriptors shared by every engine layer. No I/O, no
// provider handles; anything that needs an address or an amount lives next
// to the primitives in engine/wallet.

use crate::atoms::constants::{
    DEFAULT_CHAIN_EXPLORER_URL, DEFAULT_CHAIN_ID, DEFAULT_CHAIN_NAME, DEFAULT_CHAIN_RPC_URL,
    DEFAULT_NATIVE_CURRENCY_DECIMALS, DEFAULT_NATIVE_CURRENCY_NAME, DEFAULT_NATIVE_CURRENCY_SYMBOL,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Wallet brands ──────────────────────────────────────────────────────────

/// Which injected wallet the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Whatever single provider the environment exposes by default.
    #[default]
    Auto,
    MetaMask,
    Coinbase,
    Brave,
}

impl WalletKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::Auto => "Injected wallet",
            WalletKind::MetaMask => "MetaMask",
            WalletKind::Coinbase => "Coinbase Wallet",
            WalletKind::Brave => "Brave Wallet",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for WalletKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" | "default" => Ok(WalletKind::Auto),
            "metamask" => Ok(WalletKind::MetaMask),
            "coinbase" => Ok(WalletKind::Coinbase),
            "brave" => Ok(WalletKind::Brave),
            other => Err(format!("unknown wallet kind '{}'", other)),
        }
    }
}

// ── Chain descriptor ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Static description of the target chain, sent verbatim in
/// `wallet_addEthereumChain` when the wallet does not know it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: DEFAULT_NATIVE_CURRENCY_NAME.into(),
            symbol: DEFAULT_NATIVE_CURRENCY_SYMBOL.into(),
            decimals: DEFAULT_NATIVE_CURRENCY_DECIMALS,
        }
    }
}

/// Sepolia.
impl Default for ChainDescriptor {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            chain_name: DEFAULT_CHAIN_NAME.into(),
            rpc_urls: vec![DEFAULT_CHAIN_RPC_URL.into()],
            native_currency: NativeCurrency::default(),
            block_explorer_urls: vec![DEFAULT_CHAIN_EXPLORER_URL.into()],
        }
    }
}

impl ChainDescriptor {
    /// `0x`-prefixed hex chain id, as wallets expect it.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// The `wallet_addEthereumChain` parameter object.
    pub fn to_add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "rpcUrls": self.rpc_urls,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "blockExplorerUrls": self.block_explorer_urls,
        })
    }
}

// ── Provider lifecycle events ──────────────────────────────────────────────

/// Notifications an injected provider pushes to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

// ── Session / spend status ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Account or chain changed under us; everything was dropped and the
    /// user has to connect again.
    Invalidated,
}

/// Outcome of the spend threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendSignal {
    Nominal,
    Cautionary,
}
