// Path: crates/state/src/lib.rs
//! # Weft State Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free code. Panics are disallowed in non-test code to promote robust
//! error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # Weft State
//!
//! The versioned key-value store the block application layer writes to. Pending
//! writes live in memory until `commit`, which folds them into a chained root and,
//! when asked to, writes them through to a `NodeStore`.

pub mod state_db;

pub use state_db::StateDb;
