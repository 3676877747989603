// Path: crates/api/src/epoch/mod.rs
//! Defines the `EpochSealPolicy` trait.

use weft_types::app::BlockHeader;

/// Decides whether a closing block seals its epoch.
///
/// Implementations must be deterministic functions of the header: every node of a
/// chain has to reach the same answer for the same block.
pub trait EpochSealPolicy: Send + Sync {
    /// Returns true if `header` is the last block of its epoch.
    fn should_seal(&self, header: &BlockHeader) -> bool;
}

impl<T: EpochSealPolicy + ?Sized> EpochSealPolicy for Box<T> {
    fn should_seal(&self, header: &BlockHeader) -> bool {
        (**self).should_seal(header)
    }
}
