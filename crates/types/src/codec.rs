// Path: crates/types/src/codec.rs

//! Defines the canonical, deterministic binary codec for all consensus-critical state.
//!
//! This module provides thin wrappers around `parity-scale-codec` (SCALE). Every value
//! that is written to state, hashed into a commitment, or delivered by the ordering
//! layer as a raw payload goes through these two functions, so that all nodes agree
//! on the exact byte representation.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
///
/// This function should be used for all data that is written to consensus-critical state
/// or is included in a hash.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Result<Vec<u8>, String> {
    Ok(v.encode())
}

/// Decodes a value from its canonical SCALE byte representation.
///
/// Trailing bytes are rejected. This fails fast on any decoding error and returns a
/// descriptive string.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}
