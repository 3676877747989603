// Path: crates/node/src/replay.rs
//! Ordered batches as handed over by the DAG layer, one JSON object per line.
//!
//! ```text
//! {"height":1,"timestamp":1700000001,"txs":["0x..."],"events":[["0x<creator>","0x<event>"]]}
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{de::Error as _, Deserialize, Deserializer};
use weft_api::state::StateManager;
use weft_consensus::EventsByPeer;
use weft_execution::Application;
use weft_types::app::{EventHash, StateRoot, ValidatorId};
use weft_types::error::ChainError;

/// One round of ordered transactions together with the events that carried them.
#[derive(Debug, Clone, Deserialize)]
pub struct Batch {
    /// Height of the block the batch becomes.
    pub height: u64,
    /// Consensus timestamp in seconds.
    pub timestamp: u64,
    /// Raw transaction payloads, hex encoded on the wire.
    #[serde(default, deserialize_with = "hex_payloads")]
    pub txs: Vec<Vec<u8>>,
    /// `(creator, event)` pairs observed for the round.
    #[serde(default)]
    pub events: Vec<(ValidatorId, EventHash)>,
}

impl Batch {
    /// Indexes the batch's events by creator.
    pub fn event_index(&self) -> EventsByPeer {
        let mut index = EventsByPeer::new();
        for (creator, event) in &self.events {
            index.add_one(*event, *creator);
        }
        index
    }
}

fn hex_payloads<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
    let encoded = Vec::<String>::deserialize(deserializer)?;
    encoded
        .iter()
        .map(|s| hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom))
        .collect()
}

/// Parses newline-delimited batches. Blank lines and lines starting with `#` are
/// ignored. Heights must be strictly increasing.
pub fn parse_batches(input: &str) -> Result<Vec<Batch>> {
    let mut batches: Vec<Batch> = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let batch: Batch =
            serde_json::from_str(line).with_context(|| format!("batch on line {}", n + 1))?;
        if let Some(prev) = batches.last() {
            if batch.height <= prev.height {
                return Err(anyhow!(
                    "batch on line {} has height {} after height {}",
                    n + 1,
                    batch.height,
                    prev.height
                ));
            }
        }
        batches.push(batch);
    }
    Ok(batches)
}

/// What one committed batch amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    /// Height of the committed block.
    pub height: u64,
    /// Transactions applied.
    pub applied: usize,
    /// Transactions skipped.
    pub skipped: usize,
    /// Root after the commit.
    pub state_root: StateRoot,
    /// Whether the block sealed its epoch.
    pub seal_epoch: bool,
    /// Whether the batch's event creators hold a quorum of the current validator set.
    pub quorum: bool,
}

/// Drives `batch` through begin, deliver, end and commit.
///
/// Errors are returned unchanged; the caller decides whether they are fatal.
pub fn run_batch<S: StateManager>(
    app: &mut Application<S>,
    batch: &Batch,
) -> Result<RoundSummary, ChainError> {
    let sets = app.machine().validator_sets()?;
    let index = batch.event_index();
    let quorum = index.has_quorum(&sets.current);
    if !index.is_empty() && !quorum {
        tracing::warn!(
            target: "node",
            event = "weak_round",
            height = batch.height,
            creators_weight = %index.creators_weight(&sets.current),
            total_weight = %sets.current.total_weight,
        );
    }

    app.begin_block(batch.height, batch.timestamp)?;
    let mut applied = 0;
    for raw in &batch.txs {
        if app.deliver_tx(raw)?.is_ok() {
            applied += 1;
        }
    }
    let end = app.end_block(batch.height)?;
    let result = app.commit()?;

    let summary = RoundSummary {
        height: result.height,
        applied,
        skipped: batch.txs.len() - applied,
        state_root: result.state_root,
        seal_epoch: end.seal_epoch,
        quorum,
    };
    tracing::info!(
        target: "node",
        event = "round",
        height = summary.height,
        applied = summary.applied,
        skipped = summary.skipped,
        events = index.len(),
        quorum = summary.quorum,
        seal_epoch = summary.seal_epoch,
        root = %hex::encode(summary.state_root.as_bytes()),
    );
    Ok(summary)
}
