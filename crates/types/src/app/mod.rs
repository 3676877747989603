// Path: crates/types/src/app/mod.rs
//! Core ledger data structures like Blocks, Transactions and Receipts.

/// Block headers, blocks, receipts and logs.
pub mod block;
/// The canonical validator set and its per-epoch deltas.
pub mod consensus;
/// The genesis chain descriptor.
pub mod genesis;
/// Validator and event identities.
pub mod identity;
/// Account transactions, DAG payloads and per-transaction outcomes.
pub mod transaction;

pub use block::*;
pub use consensus::*;
pub use genesis::*;
pub use identity::*;
pub use transaction::*;

pub use primitive_types::{H160, H256, U256};

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// The 32-byte commitment over the account state after a block.
pub type StateRoot = H256;

/// Computes the Keccak-256 digest of `data`.
pub fn keccak256<T: AsRef<[u8]>>(data: T) -> H256 {
    H256::from_slice(&Keccak256::digest(data.as_ref()))
}

/// Represents the current status of the chain as persisted in state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode, Default)]
pub struct ChainStatus {
    /// The height of the last committed block (0 right after genesis).
    pub height: u64,
    /// The epoch the next block belongs to.
    pub epoch: u64,
    /// The timestamp of the latest block.
    pub latest_timestamp: u64,
    /// The total number of transactions applied since genesis.
    pub total_transactions: u64,
}

/// An externally owned account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode, Default)]
pub struct Account {
    /// The next nonce this account must use.
    pub nonce: u64,
    /// The spendable balance.
    pub balance: U256,
}
