// Path: crates/execution/src/app/notify.rs

//! Fan-out of committed blocks, transactions and logs to in-process subscribers.

use std::sync::Arc;
use tokio::sync::broadcast;
use weft_types::app::{Block, Log, Receipt, Transaction};

/// Publishes commit notifications over three broadcast channels.
///
/// Publishing never blocks. Messages sent while nobody is subscribed are dropped,
/// and a subscriber that falls behind by more than the channel capacity observes
/// `RecvError::Lagged` on its next receive.
#[derive(Debug, Clone)]
pub struct Notifier {
    blocks: broadcast::Sender<Arc<Block>>,
    transactions: broadcast::Sender<Arc<Vec<Transaction>>>,
    logs: broadcast::Sender<Arc<Vec<Log>>>,
}

impl Notifier {
    /// Creates a notifier whose channels each buffer `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (blocks, _) = broadcast::channel(capacity);
        let (transactions, _) = broadcast::channel(capacity);
        let (logs, _) = broadcast::channel(capacity);
        Self {
            blocks,
            transactions,
            logs,
        }
    }

    /// Committed blocks: header plus transactions.
    pub fn subscribe_blocks(&self) -> broadcast::Receiver<Arc<Block>> {
        self.blocks.subscribe()
    }

    /// The transaction list of each committed block.
    pub fn subscribe_transactions(&self) -> broadcast::Receiver<Arc<Vec<Transaction>>> {
        self.transactions.subscribe()
    }

    /// The logs of each committed block, flattened in receipt order.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<Arc<Vec<Log>>> {
        self.logs.subscribe()
    }

    pub(crate) fn publish(&self, block: &Block, receipts: &[Receipt]) {
        let logs = flatten_logs(receipts);
        // A send error only means nobody is listening.
        let block_subscribers = self.blocks.send(Arc::new(block.clone())).unwrap_or(0);
        let tx_subscribers = self
            .transactions
            .send(Arc::new(block.transactions.clone()))
            .unwrap_or(0);
        let log_subscribers = self.logs.send(Arc::new(logs)).unwrap_or(0);
        tracing::debug!(
            target: "execution",
            event = "notify",
            height = block.header.height,
            block_subscribers,
            tx_subscribers,
            log_subscribers,
        );
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Concatenates every receipt's logs in receipt order.
pub fn flatten_logs(receipts: &[Receipt]) -> Vec<Log> {
    receipts
        .iter()
        .flat_map(|r| r.logs.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_types::app::{ReceiptStatus, H256};

    fn receipt(tag: u8, logs: usize) -> Receipt {
        Receipt {
            tx_hash: H256::repeat_byte(tag),
            status: ReceiptStatus::Success,
            gas_used: 21_000,
            cumulative_gas_used: 21_000,
            logs: (0..logs)
                .map(|i| Log {
                    data: vec![tag, i as u8],
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn flatten_keeps_receipt_order() {
        let logs = flatten_logs(&[receipt(1, 2), receipt(2, 0), receipt(3, 1)]);
        let tags: Vec<Vec<u8>> = logs.into_iter().map(|l| l.data).collect();
        assert_eq!(tags, vec![vec![1, 0], vec![1, 1], vec![3, 0]]);
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let notifier = Notifier::new(4);
        notifier.publish(&Block::default(), &[receipt(1, 1)]);
    }

    #[tokio::test]
    async fn lagging_subscriber_does_not_block_publisher() {
        let notifier = Notifier::new(2);
        let mut rx = notifier.subscribe_blocks();
        for height in 1..=5u64 {
            let mut block = Block::default();
            block.header.height = height;
            notifier.publish(&block, &[]);
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap().header.height, 4);
    }
}
