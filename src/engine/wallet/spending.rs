// Pulse Wallet Engine — Spend tracking
//
// Running total of the active account's confirmed outgoing volume, fed by
// transfer-notification events, plus the threshold classification that
// runs after every qualifying event.

use super::contract::TransferNotification;
use super::primitives::Address;
use crate::atoms::constants::DEFAULT_SPEND_THRESHOLD;
use crate::atoms::types::SpendSignal;
use log::{info, warn};
use std::collections::HashSet;

/// Classify a running total against the default threshold.
pub fn check_spending(total: f64) -> SpendSignal {
    classify(total, DEFAULT_SPEND_THRESHOLD)
}

/// `total > threshold` is cautionary; everything else nominal.
pub fn classify(total: f64, threshold: f64) -> SpendSignal {
    if total > threshold {
        SpendSignal::Cautionary
    } else {
        SpendSignal::Nominal
    }
}

/// Per-session accumulator. Each notification is identified by
/// `(tx_hash, log_index)` and counted at most once.
#[derive(Debug, Clone)]
pub struct SpendTracker {
    account: Address,
    decimals: u8,
    threshold: f64,
    total: f64,
    seen: HashSet<(String, u64)>,
}

/// What one accepted event did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpendUpdate {
    pub amount: f64,
    pub total: f64,
    pub signal: SpendSignal,
}

impl SpendTracker {
    pub fn new(account: Address, decimals: u8, threshold: f64) -> Self {
        Self { account, decimals, threshold, total: 0.0, seen: HashSet::new() }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Fold one event in. Returns `None` for events from other senders and
    /// for duplicates.
    pub fn observe(&mut self, event: &TransferNotification) -> Option<SpendUpdate> {
        if event.sender != self.account {
            return None;
        }
        if !self.seen.insert((event.tx_hash.clone(), event.log_index)) {
            warn!("[spend] Duplicate notification {}#{} ignored", event.tx_hash, event.log_index);
            return None;
        }
        let amount = event.amount.to_f64(self.decimals);
        self.total += amount;
        let signal = classify(self.total, self.threshold);
        match signal {
            SpendSignal::Cautionary => {
                warn!("[spend] Alert: {} spent so far, consider slowing down", self.total)
            }
            SpendSignal::Nominal => info!("[spend] Spending: {}, looking good", self.total),
        }
        Some(SpendUpdate { amount, total: self.total, signal })
    }
}
