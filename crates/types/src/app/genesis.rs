// Path: crates/types/src/app/genesis.rs

use super::{keccak256, Address, ValidatorId, H256, U256};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A validator present at genesis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct GenesisValidator {
    /// The validator identity.
    pub id: ValidatorId,
    /// The consensus weight.
    pub weight: u64,
}

/// An initial account balance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct GenesisAllocation {
    /// The funded account.
    pub address: Address,
    /// The initial balance.
    pub balance: U256,
}

/// The genesis descriptor every node of a chain must agree on.
///
/// Equality is checked field by field through [`ChainInfo::mismatched_fields`] so that
/// an incompatible peer can be told exactly what differs.
#[derive(Serialize, Deserialize, Debug, Clone, Encode, Decode)]
pub struct ChainInfo {
    /// Numeric chain identifier.
    pub chain_id: u64,
    /// Human-readable network name.
    pub name: String,
    /// Genesis timestamp in seconds.
    pub genesis_time: u64,
    /// Gas available to each block.
    pub block_gas_limit: u64,
    /// The initial validator set.
    pub validators: Vec<GenesisValidator>,
    /// Initial account balances.
    #[serde(default)]
    pub allocations: Vec<GenesisAllocation>,
}

impl ChainInfo {
    /// Returns the names of the fields that differ between `self` and `other`, in
    /// declaration order. Empty means the descriptors are identical.
    pub fn mismatched_fields(&self, other: &ChainInfo) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.chain_id != other.chain_id {
            fields.push("chain_id");
        }
        if self.name != other.name {
            fields.push("name");
        }
        if self.genesis_time != other.genesis_time {
            fields.push("genesis_time");
        }
        if self.block_gas_limit != other.block_gas_limit {
            fields.push("block_gas_limit");
        }
        if self.validators != other.validators {
            fields.push("validators");
        }
        if self.allocations != other.allocations {
            fields.push("allocations");
        }
        fields
    }

    /// Returns true if every field matches.
    pub fn matches(&self, other: &ChainInfo) -> bool {
        self.mismatched_fields(other).is_empty()
    }

    /// The Keccak-256 hash of the canonical encoding, stored as the genesis marker.
    pub fn hash(&self) -> H256 {
        keccak256(self.encode())
    }
}
