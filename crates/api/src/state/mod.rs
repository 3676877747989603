// Path: crates/api/src/state/mod.rs
//! Core traits for state management.
//!
//! - `StateAccess`: basic key-value operations, object safe so executors can work on
//!   any layer of state.
//! - `StateOverlay`: a copy-on-write layer used to isolate one transaction.
//! - `StateManager`: the versioned store that turns pending writes into a root.

mod accessor;
mod manager;
mod overlay;

pub use accessor::*;
pub use manager::*;
pub use overlay::*;
