// Path: crates/execution/src/app/end_block.rs

//! Logic that runs when a block is closed: header finalization, the epoch seal
//! decision and validator set promotion.

use super::context::{BlockContext, SealedBlock};
use weft_api::epoch::EpochSealPolicy;
use weft_api::state::StateAccess;
use weft_types::app::{read_validator_sets, write_validator_sets, ValidatorSet, ValidatorUpdate};
use weft_types::error::{ChainError, StateError};
use weft_types::keys::VALIDATOR_SET_KEY;

/// Finalizes the header of `ctx` and decides whether it seals the epoch.
pub(super) fn close_block(
    state: &mut dyn StateAccess,
    policy: &dyn EpochSealPolicy,
    ctx: BlockContext,
) -> Result<SealedBlock, ChainError> {
    let BlockContext {
        mut header,
        cumulative_gas,
        tx_count,
        transactions,
        receipts,
        total_fee,
        origination,
        ..
    } = ctx;
    header.gas_used = cumulative_gas;
    header.tx_count = tx_count;
    header.total_fee = total_fee;

    let seal_epoch = policy.should_seal(&header);
    let validator_updates = if seal_epoch {
        tracing::info!(
            target: "end_block",
            event = "epoch_seal",
            height = header.height,
            epoch = header.epoch,
        );
        handle_validator_set_promotion(state, header.height)?
    } else {
        Vec::new()
    };

    tracing::debug!(
        target: "end_block",
        event = "block_closed",
        height = header.height,
        txs = tx_count,
        gas_used = cumulative_gas,
        total_fee = %total_fee,
        seal_epoch,
    );

    Ok(SealedBlock {
        header,
        transactions,
        receipts,
        origination,
        seal_epoch,
        validator_updates,
        consensus_params: None,
    })
}

/// Promotes the staged 'next' validator set to 'current' and returns the weight
/// changes. Returns no updates when nothing is staged.
pub(super) fn handle_validator_set_promotion(
    state: &mut dyn StateAccess,
    current_height: u64,
) -> Result<Vec<ValidatorUpdate>, ChainError> {
    let Some(bytes) = state.get(VALIDATOR_SET_KEY)? else {
        tracing::error!(
            target: "end_block",
            event = "validator_set_promotion",
            height = current_height,
            "MISSING VALIDATOR_SET_KEY before promotion check."
        );
        return Ok(Vec::new());
    };

    let mut sets = read_validator_sets(&bytes)?;
    let Some(next) = sets.next.take() else {
        return Ok(Vec::new());
    };
    if next.is_empty() {
        // An empty set would halt the chain. Keep the current one.
        tracing::warn!(
            target: "end_block",
            event = "validator_set_promotion",
            height = current_height,
            "Staged validator set is empty; discarding it."
        );
        state.insert(VALIDATOR_SET_KEY, &write_validator_sets(&sets)?)?;
        return Ok(Vec::new());
    }

    let updates = sets.current.diff(&next);
    tracing::info!(
        target: "end_block",
        event = "validator_set_promotion",
        height = current_height,
        validators = next.len(),
        total_weight = next.total_weight,
        changes = updates.len(),
    );
    sets.current = next;
    state.insert(VALIDATOR_SET_KEY, &write_validator_sets(&sets)?)?;
    Ok(updates)
}

/// Stages `next` for promotion at the next epoch seal, replacing any staged set.
pub(super) fn stage_next_validator_set(
    state: &mut dyn StateAccess,
    next: ValidatorSet,
) -> Result<(), StateError> {
    let bytes = state.get(VALIDATOR_SET_KEY)?.ok_or(StateError::KeyNotFound)?;
    let mut sets = read_validator_sets(&bytes)?;
    sets.next = Some(next);
    state.insert(VALIDATOR_SET_KEY, &write_validator_sets(&sets)?)
}
