// Pulse Wallet Engine — Provider selection
//
// Several wallets injected into one page routinely claim each other's brand
// flags (Brave and Coinbase both set `isMetaMask`). A candidate only counts
// for a brand when it sets that brand's flag and none of the conflicting ones.

use super::provider::{InjectedEnvironment, WalletCandidate};
use crate::atoms::error::{WalletError, WalletResult};
use crate::atoms::types::WalletKind;
use log::{debug, info};

/// Exact brand predicate for an explicit wallet kind.
pub fn matches_kind(candidate: &WalletCandidate, kind: WalletKind) -> bool {
    match kind {
        WalletKind::Auto => true,
        WalletKind::MetaMask => {
            candidate.is_metamask && !candidate.is_coinbase_wallet && !candidate.is_brave_wallet
        }
        // `isMetaMask` is not a conflict for these two: both set it for
        // dapp compatibility.
        WalletKind::Coinbase => candidate.is_coinbase_wallet && !candidate.is_brave_wallet,
        WalletKind::Brave => candidate.is_brave_wallet && !candidate.is_coinbase_wallet,
    }
}

/// Pick one injected provider for `kind`.
///
/// Explicit kinds search the provider list first and then the implicit
/// default handle, applying the same predicate to both. `Auto` takes the
/// implicit handle (or the first listed provider when no default is set).
pub fn select_provider(env: &InjectedEnvironment, kind: WalletKind) -> WalletResult<WalletCandidate> {
    if kind == WalletKind::Auto {
        return env
            .default
            .clone()
            .or_else(|| env.providers.first().cloned())
            .ok_or(WalletError::NoWalletDetected);
    }

    let candidates = env.candidates();
    debug!("[wallet] Selecting {} among {} candidate(s)", kind, candidates.len());

    candidates
        .iter()
        .chain(env.default.iter())
        .find(|c| matches_kind(c, kind))
        .cloned()
        .map(|c| {
            info!("[wallet] Selected {} provider '{}'", kind, c.handle.name());
            c
        })
        .ok_or(WalletError::WalletNotFound(kind))
}
