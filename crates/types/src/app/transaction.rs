// Path: crates/types/src/app/transaction.rs

use super::{keccak256, Address, ValidatorId, H256, U256};
use crate::codec;
use crate::MAX_TX_PAYLOAD_BYTES;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The 32-byte content hash of a transaction.
pub type TxHash = H256;

/// An account transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Transaction {
    /// Sender nonce.
    pub nonce: u64,
    /// The sending account.
    pub from: Address,
    /// The receiving account. `None` is reserved for contract creation.
    pub to: Option<Address>,
    /// The amount transferred.
    pub value: U256,
    /// The gas limit of this transaction.
    pub gas: u64,
    /// The price paid per unit of gas.
    pub gas_price: U256,
    /// Opaque call data.
    pub data: Vec<u8>,
}

impl Transaction {
    /// Computes the Keccak-256 hash of the canonical encoding.
    pub fn hash(&self) -> TxHash {
        keccak256(self.encode())
    }

    /// Returns `value + gas * gas_price`, or `None` on overflow.
    pub fn max_cost(&self) -> Option<U256> {
        self.gas_price
            .checked_mul(U256::from(self.gas))
            .and_then(|fee| fee.checked_add(self.value))
    }
}

/// The unit delivered by the ordering layer: a transaction together with the
/// validator that originated it on the DAG.
///
/// The originator is unrelated to the transaction's sender account; it is the
/// party credited with the fee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DagTransaction {
    /// The validator whose event carried the transaction.
    pub originator: ValidatorId,
    /// The transaction itself.
    pub transaction: Transaction,
}

impl DagTransaction {
    /// Encodes the payload in its canonical wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode()
    }

    /// Decodes a raw payload, rejecting oversized input and trailing bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, String> {
        if raw.len() > MAX_TX_PAYLOAD_BYTES {
            return Err(format!(
                "payload of {} bytes exceeds limit of {}",
                raw.len(),
                MAX_TX_PAYLOAD_BYTES
            ));
        }
        codec::from_bytes_canonical(raw)
    }
}

/// Response code for a single delivered transaction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TxCode {
    /// The transaction was applied.
    Ok = 0,
    /// The transaction was skipped and had no effect.
    Skipped = 1,
}

impl TxCode {
    /// The informational string reported alongside the code.
    pub fn info(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
        }
    }
}

/// The result reported to the ordering layer for one delivered transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Applied or skipped.
    pub code: TxCode,
    /// Hash of the transaction.
    pub tx_hash: TxHash,
    /// The gas limit declared by the transaction.
    pub gas_wanted: u64,
    /// Gas charged. Always zero when skipped.
    pub gas_used: u64,
}

impl TxOutcome {
    /// An applied outcome.
    pub fn ok(tx_hash: TxHash, gas_wanted: u64, gas_used: u64) -> Self {
        Self {
            code: TxCode::Ok,
            tx_hash,
            gas_wanted,
            gas_used,
        }
    }

    /// A skipped outcome.
    pub fn skipped(tx_hash: TxHash, gas_wanted: u64) -> Self {
        Self {
            code: TxCode::Skipped,
            tx_hash,
            gas_wanted,
            gas_used: 0,
        }
    }

    /// Returns true if the transaction was applied.
    pub fn is_ok(&self) -> bool {
        self.code == TxCode::Ok
    }

    /// The informational string for this outcome.
    pub fn info(&self) -> &'static str {
        self.code.info()
    }
}
