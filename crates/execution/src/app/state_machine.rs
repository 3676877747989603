// Path: crates/execution/src/app/state_machine.rs

//! Begin-Block, Apply-Transaction, End-Block and Commit.

use super::context::{BlockContext, CommitResponse, SealedBlock};
use super::{end_block, origination, ExecutionMachine};
use weft_api::executor::ProcessOutcome;
use weft_api::state::{StateManager, StateOverlay};
use weft_telemetry::{error_metrics, execution_metrics, time::Timer};
use weft_types::app::{Block, BlockHeader, ChainStatus, DagTransaction, TxOutcome};
use weft_types::codec;
use weft_types::error::{
    BlockError, ChainError, ErrorCode, FatalError, LifecycleError, StateError,
};
use weft_types::keys::STATUS_KEY;

impl<S: StateManager> ExecutionMachine<S> {
    /// Opens the block at `height`, which must directly follow the last commit.
    pub fn begin_block(&mut self, height: u64, timestamp: u64) -> Result<BlockContext, ChainError> {
        if !self.bootstrapped {
            return Err(LifecycleError::NotBootstrapped.into());
        }
        if let Some(open) = self.open_height {
            return Err(LifecycleError::BlockAlreadyOpen { height: open }.into());
        }
        let expected = self.status.height + 1;
        if height != expected {
            tracing::error!(
                target: "execution",
                event = "height_mismatch",
                phase = "begin_block",
                expected,
                got = height,
            );
            return Err(FatalError::HeightMismatch {
                expected,
                got: height,
            }
            .into());
        }

        let header = BlockHeader {
            height,
            parent_hash: self.last_block_hash,
            timestamp,
            epoch: self.status.epoch,
            gas_limit: self.chain.block_gas_limit,
            ..Default::default()
        };
        self.open_height = Some(height);
        tracing::debug!(target: "execution", event = "begin_block", height, timestamp);
        Ok(BlockContext::new(header))
    }

    /// Applies one finalized transaction payload to the open block.
    ///
    /// Transactions the executor skips or rejects leave no trace in the block and
    /// are reported with [`weft_types::app::TxCode::Skipped`], as is a transaction
    /// whose fee would overflow the block total. Apart from lifecycle misuse, every
    /// error is fatal.
    pub fn apply_transaction(
        &mut self,
        ctx: &mut BlockContext,
        raw: &[u8],
    ) -> Result<TxOutcome, ChainError> {
        if self.open_height != Some(ctx.height()) {
            return Err(LifecycleError::NoOpenBlock.into());
        }
        let dag_tx = DagTransaction::from_bytes(raw).map_err(|e| {
            tracing::error!(
                target: "execution",
                event = "malformed_payload",
                height = ctx.height(),
                len = raw.len(),
                error = %e,
            );
            FatalError::MalformedPayload(e)
        })?;
        let tx = &dag_tx.transaction;
        let tx_hash = tx.hash();
        let gas_wanted = tx.gas;

        let mut gas_pool = ctx.gas_pool;
        let mut cumulative_gas = ctx.cumulative_gas;
        let mut overlay = StateOverlay::new(&self.state);
        let result = self.executor.process_tx(
            tx,
            ctx.tx_count,
            &mut gas_pool,
            &mut cumulative_gas,
            &ctx.header,
            &mut overlay,
            &self.options.execution,
        );

        let (mut receipt, fee) = match result {
            Ok(ProcessOutcome::Applied { receipt, fee }) => (receipt, fee),
            Ok(ProcessOutcome::Skipped { reason }) => {
                tracing::debug!(
                    target: "execution",
                    event = "tx_skipped",
                    height = ctx.height(),
                    tx_hash = %tx_hash,
                    reason = %reason,
                );
                execution_metrics().inc_transactions("skipped");
                return Ok(TxOutcome::skipped(tx_hash, gas_wanted));
            }
            Err(e) => {
                tracing::debug!(
                    target: "execution",
                    event = "tx_skipped",
                    height = ctx.height(),
                    tx_hash = %tx_hash,
                    code = e.code(),
                    error = %e,
                );
                execution_metrics().inc_transactions("skipped");
                error_metrics().inc_error("transaction", e.code());
                return Ok(TxOutcome::skipped(tx_hash, gas_wanted));
            }
        };

        let Some(total_fee) = ctx.total_fee.checked_add(fee) else {
            let e = BlockError::FeeOverflow;
            tracing::warn!(
                target: "execution",
                event = "tx_skipped",
                height = ctx.height(),
                tx_hash = %tx_hash,
                code = e.code(),
                fee = %fee,
            );
            execution_metrics().inc_transactions("skipped");
            error_metrics().inc_error("block", e.code());
            return Ok(TxOutcome::skipped(tx_hash, gas_wanted));
        };
        // Past this point the transaction is part of the block: a failure leaves the
        // block unfinishable.
        let height = ctx.height();
        let (inserts, deletes) = overlay.into_ordered_batch();
        self.state
            .batch_apply(&inserts, &deletes)
            .map_err(|e| abort_block(height, "merge", e))?;
        // Every credit in a block is bounded by the fee total checked above.
        ctx.origination
            .credit(dag_tx.originator, fee)
            .map_err(|e| abort_block(height, "credit", e))?;

        let tx_index = ctx.tx_count;
        for log in receipt.logs.iter_mut() {
            log.block_height = ctx.height();
            log.tx_hash = tx_hash;
            log.tx_index = tx_index;
            log.log_index = ctx.log_count;
            ctx.log_count += 1;
        }
        let gas_used = receipt.gas_used;

        ctx.gas_pool = gas_pool;
        ctx.cumulative_gas = cumulative_gas;
        ctx.total_fee = total_fee;
        ctx.tx_count += 1;
        ctx.receipts.push(receipt);
        ctx.transactions.push(dag_tx.transaction);

        execution_metrics().inc_transactions("ok");
        tracing::debug!(
            target: "execution",
            event = "tx_applied",
            height = ctx.height(),
            tx_index,
            tx_hash = %tx_hash,
            gas_used,
            fee = %fee,
        );
        Ok(TxOutcome::ok(tx_hash, gas_wanted, gas_used))
    }

    /// Closes the block. `height` must match the height the context was opened for.
    pub fn end_block(&mut self, ctx: BlockContext, height: u64) -> Result<SealedBlock, ChainError> {
        if self.open_height != Some(ctx.height()) {
            return Err(LifecycleError::NoOpenBlock.into());
        }
        if height != ctx.height() {
            tracing::error!(
                target: "execution",
                event = "height_mismatch",
                phase = "end_block",
                expected = ctx.height(),
                got = height,
            );
            return Err(FatalError::HeightMismatch {
                expected: ctx.height(),
                got: height,
            }
            .into());
        }
        end_block::close_block(&mut self.state, &*self.epoch_policy, ctx).map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                abort_block(height, "end_block", e).into()
            }
        })
    }

    /// Persists the sealed block and returns the new state root.
    ///
    /// Every failure is fatal: the machine cannot tell how much of the block became
    /// durable.
    pub fn commit(&mut self, sealed: SealedBlock) -> Result<CommitResponse, ChainError> {
        if self.open_height != Some(sealed.height()) {
            return Err(LifecycleError::NoSealedBlock.into());
        }
        let metrics = execution_metrics();
        let _timer = Timer::new(metrics);
        let SealedBlock {
            mut header,
            transactions,
            receipts,
            origination,
            seal_epoch,
            validator_updates,
            consensus_params: _,
        } = sealed;
        let height = header.height;

        // A height that began must reach commit, so every failure from here on halts.
        origination::persist(&mut self.state, &origination).map_err(persistence_failed)?;

        let status = ChainStatus {
            height,
            epoch: if seal_epoch {
                self.status.epoch + 1
            } else {
                self.status.epoch
            },
            latest_timestamp: header.timestamp,
            total_transactions: self.status.total_transactions + u64::from(header.tx_count),
        };
        codec::to_bytes_canonical(&status)
            .map_err(StateError::InvalidValue)
            .and_then(|bytes| self.state.insert(STATUS_KEY, &bytes))
            .map_err(persistence_failed)?;

        let root = self
            .state
            .commit(height, self.options.flush_to_disk)
            .map_err(|e| {
                tracing::error!(target: "execution", event = "commit_failed", height, error = %e);
                persistence_failed(e)
            })?;
        header.state_root = root;
        let block = Block {
            header,
            transactions,
        };
        self.store.put_block(&block).map_err(|e| {
            tracing::error!(target: "execution", event = "put_block_failed", height, error = %e);
            persistence_failed(e)
        })?;

        let block_hash = block.hash();
        self.status = status;
        self.last_block_hash = block_hash;
        self.open_height = None;

        tracing::info!(
            target: "execution",
            event = "commit",
            height,
            epoch = self.status.epoch,
            txs = block.header.tx_count,
            gas_used = block.header.gas_used,
            seal_epoch,
            root = ?root,
        );

        self.notifier.publish(&block, &receipts);
        metrics.inc_blocks_committed();
        metrics.set_block_height(height);
        metrics.observe_block_gas_used(block.header.gas_used);
        if seal_epoch {
            metrics.inc_epochs_sealed();
        }
        self.remember_block(block);
        self.state.flush_state();

        Ok(CommitResponse {
            height,
            state_root: root,
            block_hash,
            receipts,
            seal_epoch,
            validator_updates,
        })
    }
}

fn persistence_failed(e: impl std::fmt::Display) -> FatalError {
    FatalError::PersistenceFailed(e.to_string())
}

fn abort_block(height: u64, phase: &'static str, e: impl std::fmt::Display) -> FatalError {
    tracing::error!(target: "execution", event = "block_aborted", height, phase, error = %e);
    FatalError::BlockAborted {
        height,
        reason: e.to_string(),
    }
}
