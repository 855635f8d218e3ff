// Pulse Wallet Engine — JSON-RPC Helpers
// Typed wrappers over `WalletProvider::request` for the methods the core uses.

use super::primitives::{hex_encode, parse_quantity, Address};
use super::provider::WalletProvider;
use crate::atoms::error::ProviderError;
use serde_json::{json, Value};

fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, ProviderError> {
    value
        .as_str()
        .ok_or_else(|| ProviderError::internal(format!("Invalid {} result: {}", what, value)))
}

fn as_string_list(value: &Value, what: &str) -> Result<Vec<String>, ProviderError> {
    value
        .as_array()
        .ok_or_else(|| ProviderError::internal(format!("Invalid {} result: {}", what, value)))?
        .iter()
        .map(|v| as_str(v, what).map(String::from))
        .collect()
}

/// Get chain ID via `eth_chainId`
pub(crate) async fn eth_chain_id(provider: &dyn WalletProvider) -> Result<u64, ProviderError> {
    let result = provider.request("eth_chainId", json!([])).await?;
    let hex = as_str(&result, "chain ID")?;
    parse_quantity(hex).map_err(ProviderError::internal)
}

/// Legacy chain id query. Returns a decimal string on most providers, but
/// some answer with hex, so accept both.
pub(crate) async fn net_version(provider: &dyn WalletProvider) -> Result<u64, ProviderError> {
    let result = provider.request("net_version", json!([])).await?;
    let raw = match &result {
        Value::Number(n) => return n.as_u64().ok_or_else(|| ProviderError::internal("Invalid net_version")),
        other => as_str(other, "net_version")?,
    };
    if raw.starts_with("0x") {
        parse_quantity(raw).map_err(ProviderError::internal)
    } else {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ProviderError::internal(format!("Parse net_version '{}': {}", raw, e)))
    }
}

/// Ask the wallet for account authorization (opens the wallet UI).
pub(crate) async fn eth_request_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>, ProviderError> {
    let result = provider.request("eth_requestAccounts", json!([])).await?;
    as_string_list(&result, "eth_requestAccounts")
}

/// Already-authorized accounts, without prompting.
pub(crate) async fn eth_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>, ProviderError> {
    let result = provider.request("eth_accounts", json!([])).await?;
    as_string_list(&result, "eth_accounts")
}

pub(crate) async fn wallet_switch_chain(provider: &dyn WalletProvider, chain_id_hex: &str) -> Result<(), ProviderError> {
    provider
        .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id_hex }]))
        .await
        .map(|_| ())
}

pub(crate) async fn wallet_add_chain(provider: &dyn WalletProvider, descriptor: Value) -> Result<(), ProviderError> {
    provider.request("wallet_addEthereumChain", json!([descriptor])).await.map(|_| ())
}

/// Call a contract (read-only)
pub(crate) async fn eth_call(provider: &dyn WalletProvider, to: &Address, data: &[u8]) -> Result<String, ProviderError> {
    let result = provider
        .request("eth_call", json!([{ "to": to.to_checksum(), "data": hex_encode(data) }, "latest"]))
        .await?;
    as_str(&result, "eth_call").map(String::from)
}

/// Hand a transaction to the wallet for signing and broadcast; returns the hash.
pub(crate) async fn eth_send_transaction(
    provider: &dyn WalletProvider,
    from: &Address,
    to: &Address,
    data: &[u8],
) -> Result<String, ProviderError> {
    let result = provider
        .request(
            "eth_sendTransaction",
            json!([{
                "from": from.to_checksum(),
                "to": to.to_checksum(),
                "data": hex_encode(data),
                "value": "0x0",
            }]),
        )
        .await?;
    as_str(&result, "tx hash").map(String::from)
}

/// Get transaction receipt (to check if tx was mined)
pub(crate) async fn eth_get_transaction_receipt(
    provider: &dyn WalletProvider,
    tx_hash: &str,
) -> Result<Option<Value>, ProviderError> {
    let result = provider.request("eth_getTransactionReceipt", json!([tx_hash])).await?;
    if result.is_null() { Ok(None) } else { Ok(Some(result)) }
}

pub(crate) async fn eth_block_number(provider: &dyn WalletProvider) -> Result<u64, ProviderError> {
    let result = provider.request("eth_blockNumber", json!([])).await?;
    parse_quantity(as_str(&result, "block number")?).map_err(ProviderError::internal)
}

/// `eth_getLogs` for one contract and topic0 over an inclusive block range.
pub(crate) async fn eth_get_logs(
    provider: &dyn WalletProvider,
    address: &Address,
    topic0: &str,
    from_block: u64,
    to_block: u64,
) -> Result<Vec<Value>, ProviderError> {
    let filter = json!({
        "address": address.to_checksum(),
        "fromBlock": format!("0x{:x}", from_block),
        "toBlock": format!("0x{:x}", to_block),
        "topics": [topic0],
    });
    let result = provider.request("eth_getLogs", json!([filter])).await?;
    result
        .as_array()
        .cloned()
        .ok_or_else(|| ProviderError::internal(format!("Invalid eth_getLogs result: {}", result)))
}
