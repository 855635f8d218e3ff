// Pulse Wallet Engine — Recent transfer history
// Bounded FIFO of confirmed sends for the current session.

use super::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub recipient: Address,
    /// Human-unit amount, e.g. "5" or "0.25".
    pub amount: String,
    pub tx_hash: String,
    pub confirmed_at: DateTime<Utc>,
}

impl TransferRecord {
    /// "Sent 5 WPU to 0xd8dA...6045"
    pub fn display_line(&self, symbol: &str) -> String {
        format!("Sent {} {} to {}", self.amount, symbol, self.recipient.short())
    }
}

#[derive(Debug, Clone)]
pub struct TransferHistory {
    capacity: usize,
    entries: VecDeque<TransferRecord>,
}

impl TransferHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    /// Append, evicting the oldest entry once at capacity.
    pub fn push(&mut self, record: TransferRecord) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<TransferRecord> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u8) -> TransferRecord {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        TransferRecord {
            recipient: Address::from_bytes(bytes),
            amount: n.to_string(),
            tx_hash: format!("0x{:064x}", n),
            confirmed_at: Utc::now(),
        }
    }

    #[test]
    fn sixth_insert_evicts_the_first() {
        let mut history = TransferHistory::new(5);
        for n in 1..=6 {
            history.push(record(n));
            assert!(history.records().len() <= 5);
        }
        let amounts: Vec<String> = history.records().into_iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec!["2", "3", "4", "5", "6"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut history = TransferHistory::new(3);
        for n in 0..50 {
            history.push(record(n));
            assert!(history.records().len() <= history.capacity());
        }
        assert_eq!(history.records().last().unwrap().amount, "49");
    }

    #[test]
    fn display_line_uses_short_address() {
        let r = TransferRecord {
            recipient: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap(),
            amount: "5".into(),
            tx_hash: "0xabc".into(),
            confirmed_at: Utc::now(),
        };
        assert_eq!(r.display_line("WPU"), "Sent 5 WPU to 0xd8dA...6045");
    }
}
