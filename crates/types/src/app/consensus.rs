// Path: crates/types/src/app/consensus.rs

use super::{GenesisValidator, ValidatorId};
use crate::codec;
use crate::error::StateError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone)]
struct ValidatorSetBlob {
    schema_version: u16,
    payload: ValidatorSets,
}

const VALIDATOR_SET_SCHEMA: u16 = 1;

/// Decodes the validator sets stored under `VALIDATOR_SET_KEY`.
pub fn read_validator_sets(bytes: &[u8]) -> Result<ValidatorSets, StateError> {
    let blob: ValidatorSetBlob = codec::from_bytes_canonical(bytes).map_err(StateError::Decode)?;
    if blob.schema_version != VALIDATOR_SET_SCHEMA {
        return Err(StateError::Decode(format!(
            "unknown validator set schema {}",
            blob.schema_version
        )));
    }
    Ok(blob.payload)
}

/// Encodes the validator sets for storage.
///
/// **Invariant:** both lists are written sorted by id with recomputed totals, so
/// readers may rely on the stored form being normalized.
pub fn write_validator_sets(sets: &ValidatorSets) -> Result<Vec<u8>, StateError> {
    let normalized = ValidatorSets {
        current: ValidatorSet::new(sets.current.validators.clone()),
        next: sets.next.as_ref().map(|n| ValidatorSet::new(n.validators.clone())),
    };
    codec::to_bytes_canonical(&ValidatorSetBlob {
        schema_version: VALIDATOR_SET_SCHEMA,
        payload: normalized,
    })
    .map_err(StateError::Decode)
}

/// A single validator and its consensus weight.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidatorWeight {
    /// The validator identity.
    pub id: ValidatorId,
    /// The consensus weight.
    pub weight: u64,
}

impl From<&GenesisValidator> for ValidatorWeight {
    fn from(v: &GenesisValidator) -> Self {
        Self {
            id: v.id,
            weight: v.weight,
        }
    }
}

/// The weighted set of validators active for an epoch.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatorSet {
    /// The pre-calculated sum of all weights.
    pub total_weight: u128,
    /// Validators sorted by id, without duplicates.
    pub validators: Vec<ValidatorWeight>,
}

impl ValidatorSet {
    /// Builds a normalized set: sorted by id, later duplicates winning, zero weights
    /// dropped.
    pub fn new(validators: Vec<ValidatorWeight>) -> Self {
        let merged: BTreeMap<ValidatorId, u64> = validators
            .into_iter()
            .map(|v| (v.id, v.weight))
            .filter(|(_, w)| *w > 0)
            .collect();
        let validators: Vec<ValidatorWeight> = merged
            .into_iter()
            .map(|(id, weight)| ValidatorWeight { id, weight })
            .collect();
        let total_weight = validators.iter().map(|v| u128::from(v.weight)).sum();
        Self {
            total_weight,
            validators,
        }
    }

    /// Returns the weight of `id`, or zero if it is not a member.
    pub fn weight_of(&self, id: &ValidatorId) -> u64 {
        self.validators
            .binary_search_by(|v| v.id.cmp(id))
            .ok()
            .and_then(|i| self.validators.get(i))
            .map(|v| v.weight)
            .unwrap_or(0)
    }

    /// Returns true if `id` is a member.
    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.weight_of(id) > 0
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if the set has no validators.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Computes the updates that turn `self` into `next`: changed or new weights,
    /// and a zero weight for every removed validator. Sorted by id.
    pub fn diff(&self, next: &ValidatorSet) -> Vec<ValidatorUpdate> {
        let mut updates: BTreeMap<ValidatorId, u64> = BTreeMap::new();
        for v in &self.validators {
            if !next.contains(&v.id) {
                updates.insert(v.id, 0);
            }
        }
        for v in &next.validators {
            if self.weight_of(&v.id) != v.weight {
                updates.insert(v.id, v.weight);
            }
        }
        updates
            .into_iter()
            .map(|(id, weight)| ValidatorUpdate { id, weight })
            .collect()
    }
}

/// The active validator set plus the set staged for the next epoch.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Default)]
pub struct ValidatorSets {
    /// The set active for the current epoch.
    pub current: ValidatorSet,
    /// The set promoted at the next epoch seal, if any.
    pub next: Option<ValidatorSet>,
}

/// A change to one validator's weight. A weight of zero removes the validator.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidatorUpdate {
    /// The validator identity.
    pub id: ValidatorId,
    /// The new weight.
    pub weight: u64,
}
