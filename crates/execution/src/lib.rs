// Path: crates/execution/src/lib.rs
//! # Weft Execution Crate Lints
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
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
//! # Weft Execution
//!
//! The deterministic block application core. [`ExecutionMachine`] consumes the
//! finalized transaction stream one height at a time and drives it through
//! Begin-Block, Apply-Transaction, End-Block and Commit. [`Application`] wraps it in
//! the handle-free call sequence spoken by the ordering layer.

pub mod app;
pub mod application;
pub mod epoch;
pub mod executor;

pub use crate::app::{
    BlockContext, CommitResponse, ExecutionMachine, GenesisState, MachineOptions, Notifier,
    OriginationScores, SealedBlock,
};
pub use crate::application::Application;
pub use crate::epoch::{FixedLengthEpochs, NeverSeal};
pub use crate::executor::TransferExecutor;
