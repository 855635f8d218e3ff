// Pulse Wallet Engine — Token transfer
//
// validate recipient → validate amount → balance check → submit → confirm.
// Each precondition is a distinct terminal failure, and nothing reaches the
// contract binding's `transfer` until all of them pass.

use super::contract::TokenContract;
use super::history::TransferRecord;
use super::primitives::{Address, TokenAmount};
use crate::atoms::error::{WalletError, WalletResult};
use chrono::Utc;
use log::info;

/// Token metadata the executor needs to convert and report amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Validated transfer intent, before any chain access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub recipient: Address,
    pub amount: TokenAmount,
}

/// Syntax checks only: recipient address, then a strictly positive amount.
pub fn validate_transfer(recipient: &str, amount: &str, decimals: u8) -> WalletResult<TransferIntent> {
    let recipient_addr: Address = recipient
        .parse()
        .map_err(|_| WalletError::InvalidAddress(recipient.to_string()))?;
    let amount_raw = TokenAmount::from_human(amount, decimals)?;
    if amount_raw.is_zero() {
        return Err(WalletError::InvalidAmount("Amount must be greater than zero".into()));
    }
    Ok(TransferIntent { recipient: recipient_addr, amount: amount_raw })
}

/// Send `amount` (human units) of the token to `recipient` and wait for
/// inclusion. Returns the history record for the confirmed transfer.
pub async fn execute_transfer(
    contract: &dyn TokenContract,
    recipient: &str,
    amount: &str,
    token: &TokenInfo,
) -> WalletResult<TransferRecord> {
    let intent = validate_transfer(recipient, amount, token.decimals)?;

    let balance = contract.balance_of(contract.signer()).await?;
    if balance < intent.amount {
        return Err(WalletError::InsufficientBalance {
            symbol: token.symbol.clone(),
            have: balance.to_human(token.decimals),
            need: intent.amount.to_human(token.decimals),
        });
    }

    info!(
        "[wallet] Sending {} {} from {} to {}",
        intent.amount.to_human(token.decimals),
        token.symbol,
        contract.signer(),
        intent.recipient
    );
    let pending = contract.transfer(&intent.recipient.to_checksum(), intent.amount).await?;
    let confirmation = contract.wait_for_confirmation(&pending.tx_hash).await?;
    info!("[wallet] Transfer {} confirmed in block {}", confirmation.tx_hash, confirmation.block_number);

    Ok(TransferRecord {
        recipient: pending.to,
        amount: intent.amount.to_human(token.decimals),
        tx_hash: confirmation.tx_hash,
        confirmed_at: Utc::now(),
    })
}
