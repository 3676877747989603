// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Weft Types
//!
//! This crate is the foundational library for the Weft validator node, containing all core
//! data structures, error types, and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `weft-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This structure
//! prevents circular dependencies and provides a stable, canonical definition
//! for shared types like `Block`, `Transaction`, `ValidatorId`, and the
//! error enums.

/// The maximum size in bytes for a single raw transaction payload delivered by ordering.
pub const MAX_TX_PAYLOAD_BYTES: usize = 128 * 1024; // 128 KiB

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::ChainError> = std::result::Result<T, E>;

/// Core ledger data structures like `Block`, `Transaction`, and `ValidatorId`.
pub mod app;
/// The canonical, deterministic binary codec for consensus-critical state.
pub mod codec;
/// Node configuration structures.
pub mod config;
/// A unified set of all error types used across the node.
pub mod error;
/// Constants and builders for well-known state keys.
pub mod keys;
