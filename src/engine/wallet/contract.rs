// Pulse Wallet Engine — Token contract binding
//
// `TokenContract` is the seam the transfer executor and the spend listener
// talk to. `Erc20Binding` implements it over a naming-disabled provider:
// reads go through `eth_call`, writes through the wallet's
// `eth_sendTransaction`, and events through `eth_getLogs` polling.

use super::abi::{decode_notification, decode_uint256, encode_balance_of, encode_transfer, event_topic};
use super::naming::NoNameProvider;
use super::primitives::{parse_quantity, Address, TokenAmount};
use super::provider::{NameResolver, ProviderHandle};
use super::rpc::{eth_block_number, eth_call, eth_get_logs, eth_get_transaction_receipt, eth_send_transaction};
use crate::atoms::error::{WalletError, WalletResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A transaction the wallet accepted and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub tx_hash: String,
    pub to: Address,
    pub amount: TokenAmount,
}

/// Inclusion proof for a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: String,
    pub block_number: u64,
}

/// One decoded transfer-notification event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferNotification {
    pub sender: Address,
    pub amount: TokenAmount,
    pub count: TokenAmount,
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u64,
}

#[async_trait]
pub trait TokenContract: Send + Sync {
    fn address(&self) -> &Address;

    /// The account transactions are sent from.
    fn signer(&self) -> &Address;

    async fn balance_of(&self, owner: &Address) -> WalletResult<TokenAmount>;

    /// Submit `transfer(to, amount)`. `to` goes through the provider's name
    /// resolution before encoding.
    async fn transfer(&self, to: &str, amount: TokenAmount) -> WalletResult<PendingTransfer>;

    /// Block until the transaction is included. Reverts are errors.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> WalletResult<Confirmation>;

    async fn latest_block(&self) -> WalletResult<u64>;

    /// Transfer notifications emitted in `[from_block, to_block]`, in log order.
    async fn notifications(&self, from_block: u64, to_block: u64) -> WalletResult<Vec<TransferNotification>>;
}

pub struct Erc20Binding {
    provider: Arc<NoNameProvider<ProviderHandle>>,
    address: Address,
    signer: Address,
    notification_topic: String,
    receipt_poll: Duration,
}

impl Erc20Binding {
    pub fn new(
        provider: Arc<NoNameProvider<ProviderHandle>>,
        address: Address,
        signer: Address,
        notification_event: &str,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            provider,
            address,
            signer,
            notification_topic: event_topic(notification_event),
            receipt_poll,
        }
    }

    fn parse_log(log: &Value) -> Option<TransferNotification> {
        let data = log.get("data")?.as_str()?;
        let payload = decode_notification(data)?;
        let block_number = parse_quantity(log.get("blockNumber")?.as_str()?).ok()?;
        let log_index = log
            .get("logIndex")
            .and_then(Value::as_str)
            .and_then(|s| parse_quantity(s).ok())
            .unwrap_or(0);
        let tx_hash = log.get("transactionHash").and_then(Value::as_str).unwrap_or_default().to_string();
        Some(TransferNotification {
            sender: payload.sender,
            amount: payload.amount,
            count: payload.count,
            block_number,
            tx_hash,
            log_index,
        })
    }
}

#[async_trait]
impl TokenContract for Erc20Binding {
    fn address(&self) -> &Address {
        &self.address
    }

    fn signer(&self) -> &Address {
        &self.signer
    }

    async fn balance_of(&self, owner: &Address) -> WalletResult<TokenAmount> {
        debug!("[contract] balanceOf({})", owner);
        let out = eth_call(&*self.provider, &self.address, &encode_balance_of(owner)).await?;
        decode_uint256(&out)
    }

    async fn transfer(&self, to: &str, amount: TokenAmount) -> WalletResult<PendingTransfer> {
        let to: Address = self.provider.resolve_name(to).await?.parse()?;
        let data = encode_transfer(&to, &amount);
        let tx_hash = eth_send_transaction(&*self.provider, &self.signer, &self.address, &data)
            .await
            .map_err(|e| WalletError::tx_failed(format!("submission rejected: {}", e.message)))?;
        info!("[contract] transfer({}, {}) submitted as {}", to, amount.to_base_units(), tx_hash);
        Ok(PendingTransfer { tx_hash, to, amount })
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> WalletResult<Confirmation> {
        loop {
            let receipt = eth_get_transaction_receipt(&*self.provider, tx_hash)
                .await
                .map_err(|e| WalletError::tx_failed(format!("receipt query for {} failed: {}", tx_hash, e.message)))?;
            let Some(receipt) = receipt else {
                tokio::time::sleep(self.receipt_poll).await;
                continue;
            };
            let block_number = receipt
                .get("blockNumber")
                .and_then(Value::as_str)
                .and_then(|s| parse_quantity(s).ok());
            let Some(block_number) = block_number else {
                // Some providers hand back a receipt shell before inclusion.
                tokio::time::sleep(self.receipt_poll).await;
                continue;
            };
            let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x0");
            if status != "0x1" {
                return Err(WalletError::tx_failed(format!("{} reverted in block {}", tx_hash, block_number)));
            }
            return Ok(Confirmation { tx_hash: tx_hash.to_string(), block_number });
        }
    }

    async fn latest_block(&self) -> WalletResult<u64> {
        Ok(eth_block_number(&*self.provider).await?)
    }

    async fn notifications(&self, from_block: u64, to_block: u64) -> WalletResult<Vec<TransferNotification>> {
        let logs = eth_get_logs(&*self.provider, &self.address, &self.notification_topic, from_block, to_block).await?;
        let mut out = Vec::with_capacity(logs.len());
        for log in &logs {
            match Self::parse_log(log) {
                Some(n) => out.push(n),
                None => warn!("[contract] Skipping undecodable notification log: {}", log),
            }
        }
        Ok(out)
    }
}
