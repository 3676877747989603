// Path: crates/api/src/lib.rs

//! # Weft API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
#![deny(missing_docs)]
//! # Weft API
//!
//! Core traits and interfaces for the Weft validator node. This crate defines the
//! contract between the block application core and its pluggable collaborators:
//! state storage, durable persistence, transaction execution and epoch policy.

/// The `EpochSealPolicy` trait deciding when a block closes its epoch.
pub mod epoch;
/// The `TransactionExecutor` trait and the gas accounting it operates on.
pub mod executor;
/// Core traits for state management, including `StateAccess` and `StateManager`.
pub mod state;
/// An API for the durable node store holding state and blocks.
pub mod storage;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::epoch::EpochSealPolicy;
    pub use crate::executor::{GasPool, ProcessOutcome, TransactionExecutor};
    pub use crate::state::{StateAccess, StateManager, StateOverlay};
    pub use crate::storage::{CommitInput, NodeStore, StorageError};
}
