// Path: crates/execution/src/app/origination.rs

//! Per-validator fee accounting for transactions a validator originated.

use std::collections::BTreeMap;
use weft_api::state::StateAccess;
use weft_types::app::{ValidatorId, U256};
use weft_types::codec;
use weft_types::error::StateError;
use weft_types::keys::origination_score_key;

/// Fees credited to originating validators during one block.
///
/// Additive only. Entries are kept in validator order so that persisting them
/// produces the same write sequence on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginationScores {
    credits: BTreeMap<ValidatorId, U256>,
}

impl OriginationScores {
    /// Adds `fee` to `validator`'s score. Leaves the score untouched on overflow.
    pub fn credit(&mut self, validator: ValidatorId, fee: U256) -> Result<(), StateError> {
        let entry = self.credits.entry(validator).or_default();
        *entry = entry.checked_add(fee).ok_or_else(|| {
            StateError::Overflow(format!("origination score of {}", validator))
        })?;
        Ok(())
    }

    /// The amount credited to `validator` so far. Zero if never credited.
    pub fn get(&self, validator: &ValidatorId) -> U256 {
        self.credits.get(validator).copied().unwrap_or_default()
    }

    /// Iterates credits in validator order.
    pub fn iter(&self) -> impl Iterator<Item = (&ValidatorId, &U256)> + '_ {
        self.credits.iter()
    }

    /// Sum of all credits, or `None` if it does not fit in 256 bits.
    pub fn total(&self) -> Option<U256> {
        self.credits
            .values()
            .try_fold(U256::zero(), |acc, v| acc.checked_add(*v))
    }

    /// Number of credited validators.
    pub fn len(&self) -> usize {
        self.credits.len()
    }

    /// Returns true if nothing was credited.
    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }
}

/// Reads the cumulative persisted score of `validator`.
pub fn read_score(state: &dyn StateAccess, validator: &ValidatorId) -> Result<U256, StateError> {
    match state.get(&origination_score_key(validator))? {
        Some(bytes) => codec::from_bytes_canonical(&bytes).map_err(StateError::Decode),
        None => Ok(U256::zero()),
    }
}

/// Adds every credit of the block to the cumulative persisted scores.
pub(super) fn persist(
    state: &mut dyn StateAccess,
    scores: &OriginationScores,
) -> Result<(), StateError> {
    for (validator, fee) in scores.iter() {
        let stored = read_score(state, validator)?;
        let updated = stored.checked_add(*fee).ok_or_else(|| {
            StateError::Overflow(format!("cumulative origination score of {}", validator))
        })?;
        let bytes = codec::to_bytes_canonical(&updated).map_err(StateError::InvalidValue)?;
        state.insert(&origination_score_key(validator), &bytes)?;
    }
    Ok(())
}
