// Path: crates/execution/src/application.rs

//! The handle-free call sequence spoken by the ordering layer.

use crate::app::{BlockContext, ConsensusParamUpdate, ExecutionMachine, SealedBlock};
use weft_api::state::StateManager;
use weft_types::app::{BlockResult, ChainInfo, StateRoot, TxOutcome, ValidatorUpdate};
use weft_types::error::{ChainError, LifecycleError};

enum Phase {
    Uninitialized,
    Idle,
    Open(BlockContext),
    Sealed(SealedBlock),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Idle => "idle",
            Phase::Open(_) => "open",
            Phase::Sealed(_) => "sealed",
        }
    }
}

/// What `end_block` reports to the ordering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndBlockResponse {
    /// Whether the block seals its epoch.
    pub seal_epoch: bool,
    /// Validator weight changes taking effect after the block.
    pub validator_updates: Vec<ValidatorUpdate>,
    /// Consensus parameter changes. Always `None` for now.
    pub consensus_params: Option<ConsensusParamUpdate>,
}

/// Owns an [`ExecutionMachine`] together with the open or sealed block, so that
/// callers can drive it with plain `init_chain`, `begin_block`, `deliver_tx`,
/// `end_block` and `commit` calls.
///
/// A call made in the wrong phase returns a [`LifecycleError`] and leaves the phase
/// unchanged. Fatal errors are returned as-is.
pub struct Application<S: StateManager> {
    machine: ExecutionMachine<S>,
    phase: Phase,
}

impl<S: StateManager> Application<S> {
    /// Wraps `machine`. A machine that is already bootstrapped starts idle.
    pub fn new(machine: ExecutionMachine<S>) -> Self {
        let phase = if machine.is_bootstrapped() {
            Phase::Idle
        } else {
            Phase::Uninitialized
        };
        Self { machine, phase }
    }

    /// The wrapped machine.
    pub fn machine(&self) -> &ExecutionMachine<S> {
        &self.machine
    }

    /// Mutable access to the wrapped machine, for staging validator sets.
    pub fn machine_mut(&mut self) -> &mut ExecutionMachine<S> {
        &mut self.machine
    }

    /// The current phase name, for logs.
    pub fn phase(&self) -> &'static str {
        self.phase.name()
    }

    /// Bootstraps the chain from the descriptor delivered by consensus.
    pub fn init_chain(&mut self, genesis: &ChainInfo) -> Result<StateRoot, ChainError> {
        if !matches!(self.phase, Phase::Uninitialized) {
            return Err(LifecycleError::AlreadyBootstrapped.into());
        }
        let root = self.machine.bootstrap(genesis)?;
        self.phase = Phase::Idle;
        Ok(root)
    }

    /// Opens the block at `height`.
    pub fn begin_block(&mut self, height: u64, timestamp: u64) -> Result<(), ChainError> {
        match &self.phase {
            Phase::Uninitialized => return Err(LifecycleError::NotBootstrapped.into()),
            Phase::Open(ctx) => {
                return Err(LifecycleError::BlockAlreadyOpen {
                    height: ctx.height(),
                }
                .into())
            }
            Phase::Sealed(sealed) => {
                return Err(LifecycleError::BlockAlreadyOpen {
                    height: sealed.height(),
                }
                .into())
            }
            Phase::Idle => {}
        }
        let ctx = self.machine.begin_block(height, timestamp)?;
        self.phase = Phase::Open(ctx);
        Ok(())
    }

    /// Applies one raw transaction payload to the open block.
    pub fn deliver_tx(&mut self, raw: &[u8]) -> Result<TxOutcome, ChainError> {
        match &mut self.phase {
            Phase::Open(ctx) => self.machine.apply_transaction(ctx, raw),
            _ => Err(LifecycleError::NoOpenBlock.into()),
        }
    }

    /// Closes the open block, which must be at `height`.
    pub fn end_block(&mut self, height: u64) -> Result<EndBlockResponse, ChainError> {
        let ctx = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Open(ctx) => ctx,
            other => {
                self.phase = other;
                return Err(LifecycleError::NoOpenBlock.into());
            }
        };
        let sealed = self.machine.end_block(ctx, height)?;
        let response = EndBlockResponse {
            seal_epoch: sealed.seal_epoch(),
            validator_updates: sealed.validator_updates().to_vec(),
            consensus_params: sealed.consensus_params().cloned(),
        };
        self.phase = Phase::Sealed(sealed);
        Ok(response)
    }

    /// Commits the sealed block and returns its result.
    pub fn commit(&mut self) -> Result<BlockResult, ChainError> {
        let sealed = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Sealed(sealed) => sealed,
            other => {
                self.phase = other;
                return Err(LifecycleError::NoSealedBlock.into());
            }
        };
        Ok(self.machine.commit(sealed)?.into_block_result())
    }
}
