// ── Pulse Atoms: Constants ─────────────────────────────────────────────────
// All named constants for the crate live here. Every value that a deployment
// might want to change is only a *default*: `WalletConfig` carries the live
// value and falls back to these.

// ── Target network (Sepolia) ──────────────────────────────────────────────
pub(crate) const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub(crate) const DEFAULT_CHAIN_NAME: &str = "Sepolia Test Network";
pub(crate) const DEFAULT_CHAIN_RPC_URL: &str = "https://sepolia.infura.io/v3/";
pub(crate) const DEFAULT_CHAIN_EXPLORER_URL: &str = "https://sepolia.etherscan.io";
pub(crate) const DEFAULT_NATIVE_CURRENCY_NAME: &str = "Sepolia ETH";
pub(crate) const DEFAULT_NATIVE_CURRENCY_SYMBOL: &str = "ETH";
pub(crate) const DEFAULT_NATIVE_CURRENCY_DECIMALS: u8 = 18;

// ── Token contract ────────────────────────────────────────────────────────
// Address of the deployed WorldPulse proxy. Validated at connect time, so a
// malformed value surfaces as `InvalidAddress` rather than at startup.
pub(crate) const DEFAULT_TOKEN_ADDRESS: &str = "0x53911907277be8f6E6B2d3D63A5796410EfA5A0";
pub(crate) const DEFAULT_TOKEN_SYMBOL: &str = "WPU";
pub(crate) const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// ABI surface of the token contract.
pub(crate) const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";
pub(crate) const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
/// Emitted by the token on every transfer: (sender, amount, pulseCount), none indexed.
pub(crate) const DEFAULT_NOTIFICATION_EVENT: &str = "PulseEvent(address,uint256,uint256)";

// ── Spend tracking & history ──────────────────────────────────────────────
pub(crate) const DEFAULT_SPEND_THRESHOLD: f64 = 10.0;
pub(crate) const DEFAULT_HISTORY_CAPACITY: usize = 5;

// ── Advisory service ──────────────────────────────────────────────────────
pub(crate) const DEFAULT_ADVISORY_URL: &str = "http://localhost:5000/analyze";
pub const ADVISORY_FALLBACK: &str = "Unable to fetch suggestion";
pub(crate) const ADVISORY_TIMEOUT_SECS: u64 = 15;

// ── Polling cadence ───────────────────────────────────────────────────────
// Confirmation waits have no deadline; these only control how often we ask.
pub(crate) const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;
pub(crate) const DEFAULT_EVENT_POLL_MS: u64 = 4_000;
pub(crate) const DEFAULT_ACCOUNT_WATCH_MS: u64 = 3_000;

// ── Config file location ──────────────────────────────────────────────────
pub(crate) const CONFIG_DIR_NAME: &str = ".pulse-wallet";
pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";
pub(crate) const ENV_TOKEN_ADDRESS: &str = "PULSE_TOKEN_ADDRESS";
pub(crate) const ENV_ADVISORY_URL: &str = "PULSE_ADVISORY_URL";
