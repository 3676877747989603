// Path: crates/execution/src/epoch.rs
//! Built-in epoch seal policies.

use weft_api::epoch::EpochSealPolicy;
use weft_types::app::BlockHeader;
use weft_types::config::EpochConfig;

/// Seals every `blocks_per_epoch`-th block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLengthEpochs {
    /// Epoch length in blocks.
    pub blocks_per_epoch: u64,
}

impl EpochSealPolicy for FixedLengthEpochs {
    fn should_seal(&self, header: &BlockHeader) -> bool {
        self.blocks_per_epoch > 0 && header.height > 0 && header.height % self.blocks_per_epoch == 0
    }
}

/// Never seals. The genesis validator set stays active forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverSeal;

impl EpochSealPolicy for NeverSeal {
    fn should_seal(&self, _header: &BlockHeader) -> bool {
        false
    }
}

/// Builds the policy described by `config`. An epoch length of zero disables sealing.
pub fn policy_from_config(config: &EpochConfig) -> Box<dyn EpochSealPolicy> {
    match config.blocks_per_epoch {
        0 => Box::new(NeverSeal),
        n => Box::new(FixedLengthEpochs { blocks_per_epoch: n }),
    }
}
