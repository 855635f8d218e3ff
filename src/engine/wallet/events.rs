// Pulse Wallet Engine — Transfer-notification stream
//
// Pull-based subscription over `TokenContract::notifications`: a block cursor
// advances only after a range was fetched successfully, so every log in the
// chain is handed out exactly once per stream. Events emitted before the
// stream started are not replayed.

use super::contract::{TokenContract, TransferNotification};
use crate::atoms::error::WalletResult;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct NotificationPoller {
    contract: Arc<dyn TokenContract>,
    /// Next block to fetch. `None` until the starting head is known.
    cursor: Option<u64>,
    interval: Duration,
}

impl NotificationPoller {
    pub fn new(contract: Arc<dyn TokenContract>, interval: Duration) -> Self {
        Self { contract, cursor: None, interval }
    }

    /// Pin the cursor to the block after the current head.
    pub async fn start_at_head(&mut self) -> WalletResult<u64> {
        let head = self.contract.latest_block().await?;
        self.cursor = Some(head + 1);
        Ok(head + 1)
    }

    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Fetch everything between the cursor and the current head.
    pub async fn poll_once(&mut self) -> WalletResult<Vec<TransferNotification>> {
        let from = match self.cursor {
            Some(c) => c,
            None => self.start_at_head().await?,
        };
        let head = self.contract.latest_block().await?;
        if head < from {
            return Ok(Vec::new());
        }
        let events = self.contract.notifications(from, head).await?;
        debug!("[contract] {} notification(s) in blocks {}..={}", events.len(), from, head);
        self.cursor = Some(head + 1);
        Ok(events)
    }

    /// Run until the receiver is dropped or the task is aborted.
    pub fn spawn(mut self, tx: mpsc::Sender<TransferNotification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let events = match self.poll_once().await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("[contract] Notification poll failed, retrying: {}", e);
                        continue;
                    }
                };
                for event in events {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::error::WalletError;
    use crate::engine::wallet::contract::{Confirmation, PendingTransfer};
    use crate::engine::wallet::primitives::{Address, TokenAmount};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Chain with a settable head and one log per block.
    struct FakeChain {
        address: Address,
        head: Mutex<u64>,
        fail_next: Mutex<bool>,
        ranges: Mutex<Vec<(u64, u64)>>,
    }

    impl FakeChain {
        fn at(head: u64) -> Arc<Self> {
            Arc::new(Self {
                address: Address::from_bytes([0xaa; 20]),
                head: Mutex::new(head),
                fail_next: Mutex::new(false),
                ranges: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TokenContract for FakeChain {
        fn address(&self) -> &Address {
            &self.address
        }

        fn signer(&self) -> &Address {
            &self.address
        }

        async fn balance_of(&self, _owner: &Address) -> WalletResult<TokenAmount> {
            Ok(TokenAmount::ZERO)
        }

        async fn transfer(&self, _to: &str, _amount: TokenAmount) -> WalletResult<PendingTransfer> {
            Err(WalletError::tx_failed("read-only"))
        }

        async fn wait_for_confirmation(&self, _tx_hash: &str) -> WalletResult<Confirmation> {
            Err(WalletError::tx_failed("read-only"))
        }

        async fn latest_block(&self) -> WalletResult<u64> {
            Ok(*self.head.lock())
        }

        async fn notifications(&self, from: u64, to: u64) -> WalletResult<Vec<TransferNotification>> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(WalletError::tx_failed("node hiccup"));
            }
            self.ranges.lock().push((from, to));
            Ok((from..=to)
                .map(|block| TransferNotification {
                    sender: Address::from_bytes([0x11; 20]),
                    amount: TokenAmount::from_u128(1),
                    count: TokenAmount::from_u128(block as u128),
                    block_number: block,
                    tx_hash: format!("0x{:064x}", block),
                    log_index: 0,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn ranges_are_contiguous_and_disjoint() {
        let chain = FakeChain::at(100);
        let mut poller = NotificationPoller::new(chain.clone(), Duration::from_millis(10));
        assert_eq!(poller.start_at_head().await.unwrap(), 101);
        assert!(poller.poll_once().await.unwrap().is_empty());

        *chain.head.lock() = 103;
        assert_eq!(poller.poll_once().await.unwrap().len(), 3);
        *chain.head.lock() = 104;
        assert_eq!(poller.poll_once().await.unwrap().len(), 1);
        assert_eq!(*chain.ranges.lock(), vec![(101, 103), (104, 104)]);
    }

    #[tokio::test]
    async fn failed_poll_keeps_cursor() {
        let chain = FakeChain::at(10);
        let mut poller = NotificationPoller::new(chain.clone(), Duration::from_millis(10));
        poller.start_at_head().await.unwrap();
        *chain.head.lock() = 12;
        *chain.fail_next.lock() = true;
        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.cursor(), Some(11));
        let blocks: Vec<u64> = poller.poll_once().await.unwrap().iter().map(|n| n.block_number).collect();
        assert_eq!(blocks, vec![11, 12]);
    }

    #[tokio::test]
    async fn spawned_stream_delivers_events() {
        let chain = FakeChain::at(5);
        let mut poller = NotificationPoller::new(chain.clone(), Duration::from_millis(5));
        poller.start_at_head().await.unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let handle = poller.spawn(tx);
        *chain.head.lock() = 7;
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.block_number, second.block_number), (6, 7));
        handle.abort();
    }
}
