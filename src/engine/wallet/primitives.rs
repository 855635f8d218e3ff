// Pulse Wallet Engine — Ethereum Primitives
// Keccak, hex, EIP-55 addresses, and uint256 token amounts.

use crate::atoms::error::{WalletError, WalletResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Keccak-256 hash (Ethereum's hash function)
pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    use tiny_keccak::{Hasher, Keccak};
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Hex-encode bytes with 0x prefix
pub(crate) fn hex_encode(data: &[u8]) -> String {
    format!("0x{}", data.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

/// Hex-decode a 0x-prefixed string.
/// RPC quantities come minimally encoded ("0x0", "0x1a3"), so odd lengths
/// are left-padded.
pub(crate) fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.is_empty() {
        return Ok(Vec::new());
    }
    let padded;
    let hex_str = if s.len() % 2 != 0 {
        padded = format!("0{}", s);
        &padded
    } else {
        s
    };
    (0..hex_str.len())
        .step_by(2)
        .map(|i| {
            hex_str
                .get(i..i + 2)
                .ok_or_else(|| "Hex decode: non-ASCII input".to_string())
                .and_then(|pair| u8::from_str_radix(pair, 16).map_err(|e| format!("Hex decode: {}", e)))
        })
        .collect()
}

/// Parse a `0x…` quantity (chain id, block number) into a u64.
pub(crate) fn parse_quantity(s: &str) -> Result<u64, String> {
    let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
    u64::from_str_radix(digits, 16).map_err(|e| format!("Parse quantity '{}': {}", s, e))
}

/// EIP-55 mixed-case checksum address
pub(crate) fn eip55_checksum(addr_bytes: &[u8; 20]) -> String {
    let hex_addr: String = addr_bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let hash = keccak256(hex_addr.as_bytes());
    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in hex_addr.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if hash_nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}

// ── Address ────────────────────────────────────────────────────────────────

/// A validated 20-byte account or contract address.
///
/// Parsing accepts `0x` + 40 hex digits. All-lowercase and all-uppercase
/// inputs are taken as-is; mixed case must carry a correct EIP-55 checksum.
/// Equality is on the bytes, so comparisons are case-insensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Checksummed string form.
    pub fn to_checksum(&self) -> String {
        eip55_checksum(&self.0)
    }

    /// `0x1234...abcd`, for status lines and history rows.
    pub fn short(&self) -> String {
        let full = self.to_checksum();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }

    /// Whether `s` would parse as an address.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<Address>().is_ok()
    }

    /// Decode an address from a 32-byte ABI word; the upper 12 bytes must be zero.
    pub(crate) fn from_word(word: &[u8]) -> Option<Self> {
        if word.len() != 32 || word[..12].iter().any(|b| *b != 0) {
            return None;
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&word[12..]);
        Some(Address(arr))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| WalletError::InvalidAddress(s.to_string()))?;
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidAddress(s.to_string()));
        }
        let bytes = hex_decode(digits).map_err(|_| WalletError::InvalidAddress(s.to_string()))?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);

        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && eip55_checksum(&arr) != s {
            return Err(WalletError::InvalidAddress(format!("{} (bad checksum)", s)));
        }
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

// ── TokenAmount ────────────────────────────────────────────────────────────

/// A uint256 amount in base units, stored big-endian so that the derived
/// ordering is numeric ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount([u8; 32]);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount([0u8; 32]);

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn from_u128(value: u128) -> Self {
        let mut out = [0u8; 32];
        out[16..].copy_from_slice(&value.to_be_bytes());
        TokenAmount(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Parse a plain base-10 integer string (no sign, no exponent).
    pub fn from_base_units(digits: &str) -> WalletResult<Self> {
        if digits.is_empty() {
            return Err(WalletError::InvalidAmount("empty amount".into()));
        }
        let mut acc = [0u8; 32];
        for c in digits.chars() {
            let d = c
                .to_digit(10)
                .ok_or_else(|| WalletError::InvalidAmount(format!("invalid character '{}'", c)))?;
            // acc = acc * 10 + d
            let mut carry = d as u16;
            for byte in acc.iter_mut().rev() {
                let v = *byte as u16 * 10 + carry;
                *byte = (v & 0xff) as u8;
                carry = v >> 8;
            }
            if carry != 0 {
                return Err(WalletError::InvalidAmount(format!("{} overflows uint256", digits)));
            }
        }
        Ok(TokenAmount(acc))
    }

    /// Convert a human amount ("1.5") into base units for `decimals`.
    pub fn from_human(amount: &str, decimals: u8) -> WalletResult<Self> {
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(WalletError::InvalidAmount("Amount must be a positive number".into()));
        }
        if amount.contains(['e', 'E']) {
            return Err(WalletError::InvalidAmount("scientific notation not supported, use plain decimal".into()));
        }
        let (integer_part, decimal_part) = match amount.split_once('.') {
            Some((i, d)) => (i, d),
            None => (amount, ""),
        };
        if decimal_part.contains('.') || (integer_part.is_empty() && decimal_part.is_empty()) {
            return Err(WalletError::InvalidAmount(format!("'{}' is not a number", amount)));
        }
        if decimal_part.len() > decimals as usize {
            return Err(WalletError::InvalidAmount(format!(
                "too many decimal places (max {} for this token)",
                decimals
            )));
        }
        let padded = format!("{}{:0<width$}", integer_part, decimal_part, width = decimals as usize);
        let trimmed = padded.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(TokenAmount::ZERO);
        }
        Self::from_base_units(trimmed)
    }

    /// Decode an RPC quantity or a 32-byte ABI word given as hex.
    pub fn from_hex(s: &str) -> WalletResult<Self> {
        let bytes = hex_decode(s).map_err(WalletError::InvalidAmount)?;
        Self::from_word(&bytes)
    }

    /// Big-endian bytes of at most 32 bytes, left-padded.
    pub(crate) fn from_word(bytes: &[u8]) -> WalletResult<Self> {
        let significant = match bytes.iter().position(|b| *b != 0) {
            Some(pos) => &bytes[pos..],
            None => &[],
        };
        if significant.len() > 32 {
            return Err(WalletError::InvalidAmount("value exceeds 32 bytes".into()));
        }
        let mut out = [0u8; 32];
        out[32 - significant.len()..].copy_from_slice(significant);
        Ok(TokenAmount(out))
    }

    /// Minimal `0x…` quantity hex for JSON-RPC.
    pub fn to_quantity_hex(&self) -> String {
        match self.0.iter().position(|b| *b != 0) {
            Some(pos) => {
                let hex: String = self.0[pos..].iter().map(|b| format!("{:02x}", b)).collect();
                format!("0x{}", hex.trim_start_matches('0'))
            }
            None => "0x0".to_string(),
        }
    }

    /// Base-10 string of the raw base-unit value.
    pub fn to_base_units(&self) -> String {
        let mut value: Vec<u8> = Vec::new();
        for &b in &self.0 {
            let mut carry = b as u16;
            for d in value.iter_mut().rev() {
                let val = *d as u16 * 256 + carry;
                *d = (val % 10) as u8;
                carry = val / 10;
            }
            while carry > 0 {
                value.insert(0, (carry % 10) as u8);
                carry /= 10;
            }
        }
        if value.is_empty() {
            return "0".to_string();
        }
        value.iter().map(|d| (d + b'0') as char).collect()
    }

    /// Human-readable amount: base / 10^decimals, trailing zeros trimmed.
    pub fn to_human(&self, decimals: u8) -> String {
        let decimal_str = self.to_base_units();
        if decimals == 0 {
            return decimal_str;
        }
        let dec = decimals as usize;
        let padded = format!("{:0>width$}", decimal_str, width = dec + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - dec);
        let frac = frac_part.trim_end_matches('0');
        if frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac)
        }
    }

    /// Human amount as a float, for the running spend total.
    pub fn to_f64(&self, decimals: u8) -> f64 {
        self.to_human(decimals).parse().unwrap_or(0.0)
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self.to_base_units())
    }
}
