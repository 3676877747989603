// Path: crates/types/src/error/mod.rs
//! Core error types for the Weft validator node.
//!
//! Errors fall into two tiers. [`FatalError`] covers the conditions under which the
//! node can no longer trust that it follows consensus; the hosting process is expected
//! to log them and exit. Everything else is recoverable at some boundary, and the
//! per-transaction errors in [`TransactionError`] are absorbed entirely by the block
//! application layer.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors related to the state store or state accessors.
#[derive(Error, Debug)]
pub enum StateError {
    /// The requested key was not found in the state.
    #[error("Key not found in state")]
    KeyNotFound,
    /// An error occurred in the state backend.
    #[error("State backend error: {0}")]
    Backend(String),
    /// An error occurred while writing to the state.
    #[error("State write error: {0}")]
    WriteError(String),
    /// The provided value was invalid.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// An error occurred during state deserialization.
    #[error("Decode error: {0}")]
    Decode(String),
    /// An arithmetic operation on a stored quantity overflowed.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::WriteError(_) => "STATE_WRITE_ERROR",
            Self::InvalidValue(_) => "STATE_INVALID_VALUE",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::Overflow(_) => "STATE_OVERFLOW",
        }
    }
}

/// Errors related to block assembly.
#[derive(Debug, Error)]
pub enum BlockError {
    /// The block's height is incorrect.
    #[error("Invalid block height. Expected {expected}, got {got}")]
    InvalidHeight {
        /// The expected block height.
        expected: u64,
        /// The height that was supplied.
        got: u64,
    },
    /// The running block fee total overflowed 256 bits.
    #[error("Block fee total overflowed")]
    FeeOverflow,
    /// A generic, unspecified block validation error.
    #[error("Invalid block: {0}")]
    Invalid(String),
}

impl ErrorCode for BlockError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidHeight { .. } => "BLOCK_INVALID_HEIGHT",
            Self::FeeOverflow => "BLOCK_FEE_OVERFLOW",
            Self::Invalid(_) => "BLOCK_INVALID",
        }
    }
}

/// Errors reported by a transaction executor for a single transaction.
///
/// These never abort a block: the application layer converts them into a skipped outcome.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The transaction nonce is lower than the account nonce.
    #[error("Nonce too low. Expected {expected}, got {got}")]
    NonceTooLow {
        /// The account's next nonce.
        expected: u64,
        /// The nonce carried by the transaction.
        got: u64,
    },
    /// The transaction nonce is ahead of the account nonce.
    #[error("Nonce too high. Expected {expected}, got {got}")]
    NonceTooHigh {
        /// The account's next nonce.
        expected: u64,
        /// The nonce carried by the transaction.
        got: u64,
    },
    /// The sender cannot cover value plus the maximum fee.
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// The sender's balance (decimal).
        balance: String,
        /// The amount required (decimal).
        required: String,
    },
    /// The gas limit is below the intrinsic cost of the transaction.
    #[error("Intrinsic gas too low: required {required}, provided {provided}")]
    IntrinsicGas {
        /// Intrinsic gas required.
        required: u64,
        /// Gas limit provided.
        provided: u64,
    },
    /// The block gas pool cannot cover the transaction's gas limit.
    #[error("Block gas limit reached: requested {requested}, available {available}")]
    GasLimitReached {
        /// Gas requested by the transaction.
        requested: u64,
        /// Gas remaining in the block pool.
        available: u64,
    },
    /// The gas price is below the configured minimum.
    #[error("Gas price below minimum")]
    GasPriceTooLow,
    /// A state access failed during execution.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// A generic, unspecified transaction error.
    #[error("Invalid transaction: {0}")]
    Invalid(String),
}

impl ErrorCode for TransactionError {
    fn code(&self) -> &'static str {
        match self {
            Self::NonceTooLow { .. } => "TX_NONCE_TOO_LOW",
            Self::NonceTooHigh { .. } => "TX_NONCE_TOO_HIGH",
            Self::InsufficientFunds { .. } => "TX_INSUFFICIENT_FUNDS",
            Self::IntrinsicGas { .. } => "TX_INTRINSIC_GAS",
            Self::GasLimitReached { .. } => "TX_GAS_LIMIT_REACHED",
            Self::GasPriceTooLow => "TX_GAS_PRICE_TOO_LOW",
            Self::State(_) => "TX_STATE_ERROR",
            Self::Invalid(_) => "TX_INVALID",
        }
    }
}

/// Errors raised while decoding or merging the per-creator event index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The serialized form could not be decoded at all.
    #[error("Event index decode error: {0}")]
    Decode(String),
    /// The same (validator, event) pair appeared twice in a serialized index.
    #[error("Duplicate (validator, event) pair in event index: ({validator}, {event})")]
    DuplicatePair {
        /// Hex rendering of the validator identity.
        validator: String,
        /// Hex rendering of the event hash.
        event: String,
    },
}

impl IndexError {
    /// Returns true if this error signals corruption rather than a malformed input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicatePair { .. })
    }
}

impl ErrorCode for IndexError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "INDEX_DECODE_ERROR",
            Self::DuplicatePair { .. } => "INDEX_DUPLICATE_PAIR",
        }
    }
}

/// Errors for calls made in the wrong lifecycle phase.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A block operation was attempted before genesis.
    #[error("Chain has not been bootstrapped")]
    NotBootstrapped,
    /// Genesis was requested more than once on the same machine.
    #[error("Chain is already bootstrapped")]
    AlreadyBootstrapped,
    /// A transaction or end-block call arrived with no block open.
    #[error("No block is open")]
    NoOpenBlock,
    /// A begin-block call arrived while another block is still open.
    #[error("Block {height} is still open")]
    BlockAlreadyOpen {
        /// Height of the block that is still open.
        height: u64,
    },
    /// A commit arrived for a block that has not been ended.
    #[error("No sealed block to commit")]
    NoSealedBlock,
}

impl ErrorCode for LifecycleError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotBootstrapped => "LIFECYCLE_NOT_BOOTSTRAPPED",
            Self::AlreadyBootstrapped => "LIFECYCLE_ALREADY_BOOTSTRAPPED",
            Self::NoOpenBlock => "LIFECYCLE_NO_OPEN_BLOCK",
            Self::BlockAlreadyOpen { .. } => "LIFECYCLE_BLOCK_ALREADY_OPEN",
            Self::NoSealedBlock => "LIFECYCLE_NO_SEALED_BLOCK",
        }
    }
}

/// Conditions under which the node has diverged from, or can no longer trust, consensus.
///
/// The core never terminates the process itself. A host receiving one of these must log
/// it and stop producing blocks.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The genesis descriptor supplied by consensus differs from the node's own.
    #[error("Incompatible chain: genesis descriptor differs in [{}]", .fields.join(", "))]
    GenesisMismatch {
        /// The descriptor fields that differ.
        fields: Vec<&'static str>,
    },
    /// The height supplied by consensus differs from the tracked block height.
    #[error("Missed block: current {expected}, got {got}")]
    HeightMismatch {
        /// The height tracked by the execution context.
        expected: u64,
        /// The height supplied by the caller.
        got: u64,
    },
    /// Durable persistence failed during commit.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
    /// A serialized event index carried a duplicate pair.
    #[error("Event index corruption: {0}")]
    IndexCorruption(IndexError),
    /// A finalized transaction payload could not be decoded.
    #[error("Malformed transaction payload: {0}")]
    MalformedPayload(String),
    /// An open block could not be carried forward to commit.
    #[error("Block {height} aborted: {reason}")]
    BlockAborted {
        /// Height of the block that was open.
        height: u64,
        /// The underlying failure.
        reason: String,
    },
}

impl ErrorCode for FatalError {
    fn code(&self) -> &'static str {
        match self {
            Self::GenesisMismatch { .. } => "FATAL_GENESIS_MISMATCH",
            Self::HeightMismatch { .. } => "FATAL_HEIGHT_MISMATCH",
            Self::PersistenceFailed(_) => "FATAL_PERSISTENCE_FAILED",
            Self::IndexCorruption(_) => "FATAL_INDEX_CORRUPTION",
            Self::MalformedPayload(_) => "FATAL_MALFORMED_PAYLOAD",
            Self::BlockAborted { .. } => "FATAL_BLOCK_ABORTED",
        }
    }
}

/// The top-level error returned by the block application layer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A state access error.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// A block assembly error.
    #[error("Block error: {0}")]
    Block(#[from] BlockError),
    /// A transaction error that escaped the per-transaction boundary.
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
    /// A call made in the wrong lifecycle phase.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// A process-halting condition.
    #[error("FATAL: {0}")]
    Fatal(#[from] FatalError),
}

impl ChainError {
    /// Returns true if the host must stop after observing this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<IndexError> for ChainError {
    fn from(e: IndexError) -> Self {
        if e.is_fatal() {
            Self::Fatal(FatalError::IndexCorruption(e))
        } else {
            Self::State(StateError::Decode(e.to_string()))
        }
    }
}

impl ErrorCode for ChainError {
    fn code(&self) -> &'static str {
        match self {
            Self::State(e) => e.code(),
            Self::Block(e) => e.code(),
            Self::Transaction(e) => e.code(),
            Self::Lifecycle(e) => e.code(),
            Self::Fatal(e) => e.code(),
        }
    }
}
