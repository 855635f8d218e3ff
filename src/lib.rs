// Pulse Wallet — wallet session and transaction core for the WorldPulse token.
//
// Layers:
//   atoms/  — constants, error taxonomy, plain data types (no I/O)
//   engine/ — configuration and the wallet engine built on top of atoms

pub mod atoms;
pub mod engine;

pub use atoms::constants::ADVISORY_FALLBACK;
pub use atoms::error::{ProviderError, WalletError, WalletResult};
pub use atoms::types::{ChainDescriptor, ConnectionStatus, NativeCurrency, ProviderEvent, SpendSignal, WalletKind};
pub use engine::config::{WalletConfig, WalletEntry};
pub use engine::wallet::*;
