// Path: crates/api/src/executor/mod.rs
//! Defines the `TransactionExecutor` trait and the block gas pool.

use crate::state::StateAccess;
use weft_types::app::{BlockHeader, Receipt, Transaction, U256};
use weft_types::error::TransactionError;

pub use weft_types::config::ExecutionConfig;

/// The gas still available to the block being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPool(u64);

impl GasPool {
    /// Creates a pool holding `limit` gas.
    pub fn new(limit: u64) -> Self {
        Self(limit)
    }

    /// Gas remaining.
    pub fn available(&self) -> u64 {
        self.0
    }

    /// Deducts `amount`, failing without change if the pool cannot cover it.
    pub fn sub_gas(&mut self, amount: u64) -> Result<(), TransactionError> {
        match self.0.checked_sub(amount) {
            Some(rest) => {
                self.0 = rest;
                Ok(())
            }
            None => Err(TransactionError::GasLimitReached {
                requested: amount,
                available: self.0,
            }),
        }
    }

    /// Returns unused gas to the pool.
    pub fn add_gas(&mut self, amount: u64) {
        self.0 = self.0.saturating_add(amount);
    }
}

/// What the executor did with one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The transaction was applied and produced a receipt and a fee.
    Applied {
        /// The receipt. Its log positions are stamped by the caller.
        receipt: Receipt,
        /// The fee charged to the sender.
        fee: U256,
    },
    /// The transaction was not applicable in non-strict mode.
    Skipped {
        /// A human-readable reason for logs.
        reason: String,
    },
}

/// Executes a single transaction against a state layer.
///
/// With `config.strict` unset an inapplicable transaction may be reported as
/// [`ProcessOutcome::Skipped`]; in strict mode it must be an error. Either way the
/// caller discards every change made to `state`, `gas_pool` and `cumulative_gas`.
pub trait TransactionExecutor: Send + Sync {
    /// Processes `tx` at position `tx_index` in the block described by `header`.
    #[allow(clippy::too_many_arguments)]
    fn process_tx(
        &self,
        tx: &Transaction,
        tx_index: u32,
        gas_pool: &mut GasPool,
        cumulative_gas: &mut u64,
        header: &BlockHeader,
        state: &mut dyn StateAccess,
        config: &ExecutionConfig,
    ) -> Result<ProcessOutcome, TransactionError>;
}
