// Pulse Wallet Engine — Wallet Session Module (EIP-1193 / ERC-20)
//
// Submodules, leaves first:
//   primitives    — keccak256, hex, checksummed Address, uint256 TokenAmount
//   abi           — selectors, calldata encoding, notification decoding
//   provider      — injected-provider trait, candidates, discovery
//   rpc           — typed wrappers over provider.request
//   http_provider — JSON-RPC-over-HTTP provider with account/chain watcher
//   naming        — provider decorator that refuses name resolution
//   selector      — brand-aware provider selection
//   network       — detect / switch / add-chain negotiation
//   contract      — token contract binding (balanceOf, transfer, events)
//   history       — bounded FIFO of confirmed transfers
//   transfer      — validate → balance check → submit → confirm
//   events        — block-cursor notification stream
//   spending      — running spend total + threshold check
//   advisory      — external spend advice, with fallback text
//   session       — WalletClient: connect / send / teardown, observable view

pub(crate) mod abi;
pub(crate) mod rpc;
pub mod primitives;
pub mod provider;
pub mod http_provider;
pub mod naming;
pub mod selector;
pub mod network;
pub mod contract;
pub mod history;
pub mod transfer;
pub mod events;
pub mod spending;
pub mod advisory;
pub mod session;

pub use advisory::AdvisoryClient;
pub use contract::{Confirmation, Erc20Binding, PendingTransfer, TokenContract, TransferNotification};
pub use events::NotificationPoller;
pub use history::{TransferHistory, TransferRecord};
pub use http_provider::JsonRpcProvider;
pub use naming::NoNameProvider;
pub use network::{ensure_chain, read_active_chain, NegotiationOutcome};
pub use primitives::{Address, TokenAmount};
pub use provider::{InjectedEnvironment, NameResolver, ProviderHandle, WalletCandidate, WalletDiscovery, WalletProvider};
pub use selector::{matches_kind, select_provider};
pub use session::{SessionInfo, WalletClient, WalletView};
pub use spending::{check_spending, classify, SpendTracker, SpendUpdate};
pub use transfer::{execute_transfer, validate_transfer, TokenInfo, TransferIntent};
