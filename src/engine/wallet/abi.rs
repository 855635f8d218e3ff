// Pulse Wallet Engine — ABI Encoding
// Calldata for the token's balanceOf/transfer and decoding of its
// transfer-notification event.

use super::primitives::{hex_decode, hex_encode, keccak256, Address, TokenAmount};
use crate::atoms::constants::{BALANCE_OF_SIGNATURE, TRANSFER_SIGNATURE};
use crate::atoms::error::{WalletError, WalletResult};

/// Compute 4-byte function selector from signature
pub(crate) fn function_selector(sig: &str) -> [u8; 4] {
    let hash = keccak256(sig.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    sel
}

/// topic0 of an event, `0x`-hex.
pub(crate) fn event_topic(sig: &str) -> String {
    hex_encode(&keccak256(sig.as_bytes()))
}

/// ABI-encode an address (left-padded to 32 bytes)
pub(crate) fn abi_encode_address(addr: &Address) -> Vec<u8> {
    let mut encoded = vec![0u8; 12];
    encoded.extend_from_slice(addr.as_bytes());
    encoded
}

/// Encode ERC-20 balanceOf(address)
pub(crate) fn encode_balance_of(owner: &Address) -> Vec<u8> {
    let mut data = function_selector(BALANCE_OF_SIGNATURE).to_vec();
    data.extend_from_slice(&abi_encode_address(owner));
    data
}

/// Encode ERC-20 transfer(address, uint256)
pub(crate) fn encode_transfer(to: &Address, amount: &TokenAmount) -> Vec<u8> {
    let mut data = function_selector(TRANSFER_SIGNATURE).to_vec();
    data.extend_from_slice(&abi_encode_address(to));
    data.extend_from_slice(&amount.to_be_bytes());
    data
}

/// Decode a single uint256 return value from `eth_call` output.
pub(crate) fn decode_uint256(output: &str) -> WalletResult<TokenAmount> {
    let bytes = hex_decode(output).map_err(WalletError::InvalidAmount)?;
    if bytes.is_empty() {
        // A call to an address with no code returns "0x".
        return Err(WalletError::tx_failed("empty eth_call result (is the token contract deployed?)"));
    }
    TokenAmount::from_word(&bytes[..bytes.len().min(32)])
}

/// Decoded `(address sender, uint256 amount, uint256 count)` event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NotificationPayload {
    pub sender: Address,
    pub amount: TokenAmount,
    pub count: TokenAmount,
}

/// Decode the non-indexed data section of the transfer-notification event.
/// Returns `None` when the payload is short or the sender word is not a
/// clean address.
pub(crate) fn decode_notification(data: &str) -> Option<NotificationPayload> {
    let bytes = hex_decode(data).ok()?;
    if bytes.len() < 96 {
        return None;
    }
    let sender = Address::from_word(&bytes[0..32])?;
    let amount = TokenAmount::from_word(&bytes[32..64]).ok()?;
    let count = TokenAmount::from_word(&bytes[64..96]).ok()?;
    Some(NotificationPayload { sender, amount, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_selectors() {
        assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn erc20_transfer_topic_matches() {
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn transfer_calldata_layout() {
        let to: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
        let data = encode_transfer(&to, &TokenAmount::from_u128(5));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(&data[16..36], to.as_bytes());
        assert_eq!(data[67], 5);
    }

    #[test]
    fn decode_uint256_reads_word() {
        let out = format!("0x{:064x}", 10_000_000_000_000_000_000u128);
        assert_eq!(decode_uint256(&out).unwrap().to_human(18), "10");
        assert!(decode_uint256("0x").is_err());
    }

    #[test]
    fn notification_payload_decodes() {
        let sender = "d8da6bf26964af9d7eed9e03e53415d37aa96045";
        let data = format!("0x{:0>64}{:064x}{:064x}", sender, 3_000_000_000_000_000_000u128, 7u64);
        let payload = decode_notification(&data).unwrap();
        assert_eq!(payload.sender.to_checksum().to_lowercase(), format!("0x{}", sender));
        assert_eq!(payload.amount.to_human(18), "3");
        assert_eq!(payload.count, TokenAmount::from_u128(7));
    }

    #[test]
    fn short_notification_is_ignored() {
        assert!(decode_notification("0x1234").is_none());
    }
}
