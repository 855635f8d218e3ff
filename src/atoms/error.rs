// ── Pulse Atoms: Error Types ───────────────────────────────────────────────
// Single canonical error enum for the wallet core, built with `thiserror`.
//
// Design rules:
//   • One variant per terminal failure a user can see (wallet missing, wrong
//     network, bad address, bad amount, low balance, failed transaction…).
//   • Plumbing failures (HTTP, JSON, TOML, I/O) convert via `#[from]`.
//   • `WalletError` → `String` is provided via `Display` so that UI
//     boundaries can render the status line without boilerplate.

use crate::atoms::types::WalletKind;
use thiserror::Error;

// ── Provider (EIP-1193) errors ─────────────────────────────────────────────

/// Error object returned by an injected provider's `request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request in the wallet UI.
    pub const USER_REJECTED: i64 = 4001;
    /// No account is authorized for this origin.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The method is not supported by this provider.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// `wallet_switchEthereumChain` target is unknown to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// Generic JSON-RPC internal error.
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WalletError {
    /// The environment exposes no injected provider at all.
    #[error("No injected wallet detected. Please install a wallet like MetaMask.")]
    NoWalletDetected,

    /// An explicitly requested wallet brand was not among the candidates.
    #[error("{0} not detected. Please ensure it is installed and active.")]
    WalletNotFound(WalletKind),

    /// Both the switch and the add-chain path failed.
    #[error("Please switch to the {network} network in your wallet ({reason})")]
    WrongNetwork { network: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient {symbol} balance. Have: {have}, need: {need}")]
    InsufficientBalance {
        symbol: String,
        have: String,
        need: String,
    },

    /// Name resolution is disabled; only literal addresses are accepted.
    #[error("Name resolution is not supported on this network. Please use a raw address instead of: {0}")]
    UnsupportedResolution(String),

    /// Submission, revert, or confirmation failure.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Advisory service transport/parse failure. Always absorbed by
    /// `AdvisoryClient::request_advice`.
    #[error("Advisory service unavailable: {0}")]
    AdvisoryUnavailable(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Wallet already connected")]
    AlreadyConnected,

    #[error("A connection attempt is already in progress")]
    ConnectInProgress,

    #[error("A transfer is already awaiting confirmation")]
    SendInProgress,

    /// Raw provider failure that does not map onto a domain variant.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalletError {
    /// Create a wrong-network error for a chain display name and cause.
    pub fn wrong_network(network: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WrongNetwork { network: network.into(), reason: reason.into() }
    }

    /// Create a transaction failure with a message.
    pub fn tx_failed(message: impl Into<String>) -> Self {
        Self::TransactionFailed(message.into())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All wallet-core operations return this type.
pub type WalletResult<T> = Result<T, WalletError>;

// ── Conversion: WalletError → String ──────────────────────────────────────

impl From<WalletError> for String {
    fn from(e: WalletError) -> Self {
        e.to_string()
    }
}
