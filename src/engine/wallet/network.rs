// Pulse Wallet Engine — Network negotiation
//
// Detect → switch → add-and-retry, against one configured chain.

use super::provider::WalletProvider;
use super::rpc::{eth_chain_id, net_version, wallet_add_chain, wallet_switch_chain};
use crate::atoms::error::{WalletError, WalletResult};
use crate::atoms::types::ChainDescriptor;
use log::{debug, info, warn};

/// How the provider ended up on the required chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// Already there; nothing was requested.
    AlreadyActive,
    /// `wallet_switchEthereumChain` succeeded.
    Switched,
    /// The wallet did not know the chain; it was added and then activated.
    Added,
}

/// Active chain id, trying `eth_chainId` then `net_version`.
/// Returns `None` when neither answers.
pub async fn read_active_chain(provider: &dyn WalletProvider) -> Option<u64> {
    match eth_chain_id(provider).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("[network] eth_chainId not supported ({}), using net_version fallback", e);
            match net_version(provider).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("[network] net_version also failed: {}", e);
                    None
                }
            }
        }
    }
}

/// Make sure `provider` is on `target.chain_id`.
pub async fn ensure_chain(
    provider: &dyn WalletProvider,
    target: &ChainDescriptor,
) -> WalletResult<NegotiationOutcome> {
    let active = read_active_chain(provider).await;
    if active == Some(target.chain_id) {
        debug!("[network] Already on chain {}", target.chain_id);
        return Ok(NegotiationOutcome::AlreadyActive);
    }

    info!(
        "[network] Active chain {:?} != required {} ({}), requesting switch",
        active, target.chain_id, target.chain_name
    );
    let chain_hex = target.chain_id_hex();
    match wallet_switch_chain(provider, &chain_hex).await {
        Ok(()) => Ok(NegotiationOutcome::Switched),
        Err(e) if e.is_unrecognized_chain() => {
            info!("[network] Wallet does not know {}, adding it", target.chain_name);
            wallet_add_chain(provider, target.to_add_chain_params())
                .await
                .map_err(|e| WalletError::wrong_network(&target.chain_name, format!("add chain failed: {}", e.message)))?;

            // Most wallets activate a chain as part of adding it; only ask
            // again when this one did not.
            if read_active_chain(provider).await != Some(target.chain_id) {
                wallet_switch_chain(provider, &chain_hex).await.map_err(|e| {
                    WalletError::wrong_network(&target.chain_name, format!("switch after add failed: {}", e.message))
                })?;
            }
            Ok(NegotiationOutcome::Added)
        }
        Err(e) => Err(WalletError::wrong_network(&target.chain_name, e.message)),
    }
}
