// Path: crates/types/src/app/block.rs

use super::{keccak256, Address, StateRoot, Transaction, TxHash, ValidatorUpdate, H256, U256};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The execution status of an applied transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ReceiptStatus {
    /// Execution completed.
    Success,
    /// Execution reverted; the fee was still charged.
    Reverted,
}

/// An event emitted during transaction execution.
///
/// Executors fill `address`, `topics` and `data`. The positional fields are stamped
/// by the block application layer when the receipt is appended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode, Default)]
pub struct Log {
    /// The emitting account.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<H256>,
    /// Unindexed payload.
    pub data: Vec<u8>,
    /// Height of the containing block.
    pub block_height: u64,
    /// Hash of the emitting transaction.
    pub tx_hash: TxHash,
    /// Index of the emitting transaction within the block.
    pub tx_index: u32,
    /// Index of the log within the block.
    pub log_index: u32,
}

/// The record of an applied transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Receipt {
    /// Hash of the transaction.
    pub tx_hash: TxHash,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Gas charged to this transaction.
    pub gas_used: u64,
    /// Gas charged in the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Logs emitted, in emission order.
    pub logs: Vec<Log>,
}

/// A block header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode, Default)]
pub struct BlockHeader {
    /// Block height. Genesis is height 0.
    pub height: u64,
    /// Hash of the previous header.
    pub parent_hash: H256,
    /// Timestamp supplied by the ordering layer.
    pub timestamp: u64,
    /// The epoch this block belongs to.
    pub epoch: u64,
    /// The block gas limit.
    pub gas_limit: u64,
    /// Gas consumed by the applied transactions.
    pub gas_used: u64,
    /// Number of applied transactions.
    pub tx_count: u32,
    /// Sum of fees of the applied transactions.
    pub total_fee: U256,
    /// State root after the block, stamped at commit.
    pub state_root: StateRoot,
}

impl BlockHeader {
    /// Computes the Keccak-256 hash of the canonical encoding.
    pub fn hash(&self) -> H256 {
        keccak256(self.encode())
    }
}

/// A finalized block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode, Default)]
pub struct Block {
    /// The header.
    pub header: BlockHeader,
    /// The applied transactions, in application order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Returns the header hash.
    pub fn hash(&self) -> H256 {
        self.header.hash()
    }
}

/// The immutable result of ending and committing one block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    /// The committed height.
    pub height: u64,
    /// The state root after commit.
    pub state_root: StateRoot,
    /// Receipts of the applied transactions, in order.
    pub receipts: Vec<Receipt>,
    /// Whether this block sealed its epoch.
    pub seal_epoch: bool,
    /// Validator weight changes taking effect after this block.
    pub validator_updates: Vec<ValidatorUpdate>,
}
