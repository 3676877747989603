// Path: crates/node/src/lib.rs
#![forbid(unsafe_code)]
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

//! # Weft Node
//!
//! Wiring shared by the `weft-node` binary: reading ordered batches produced by the
//! DAG layer and driving them through the block lifecycle.

pub mod replay;

pub use replay::{parse_batches, run_batch, Batch, RoundSummary};
