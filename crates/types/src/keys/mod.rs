// Path: crates/types/src/keys/mod.rs
//! Defines constants for well-known state keys.
//!
//! These constants provide a single source of truth for the keys used to store
//! system data in the state manager.

use crate::app::{Address, ValidatorId};

/// The state key for the canonical `ValidatorSets` blob.
pub const VALIDATOR_SET_KEY: &[u8] = b"system::validators";

/// The state key for the persisted chain status.
pub const STATUS_KEY: &[u8] = b"chain::status";

/// The state key for the genesis marker (hash of the genesis descriptor).
pub const GENESIS_KEY: &[u8] = b"chain::genesis";

/// The state key prefix for account records.
pub const ACCOUNT_KEY_PREFIX: &[u8] = b"account::";

/// The state key prefix for per-validator origination scores.
pub const ORIGINATION_KEY_PREFIX: &[u8] = b"origination/";

/// Builds the state key of an account record.
pub fn account_key(address: &Address) -> Vec<u8> {
    [ACCOUNT_KEY_PREFIX, address.as_bytes()].concat()
}

/// Builds the state key of a validator's cumulative origination score.
pub fn origination_score_key(validator: &ValidatorId) -> Vec<u8> {
    [ORIGINATION_KEY_PREFIX, validator.as_bytes().as_slice()].concat()
}
