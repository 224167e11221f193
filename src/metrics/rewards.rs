//! Block reward distribution
//!
//! Counts sealed blocks per miner and per seal type. A miner's share is its
//! block count over all Pow and Pos blocks in the range.

use std::collections::BTreeMap;
use std::fmt;

use crate::chain::{Address, BlockRecord, SealType};

/// Blocks sealed by one miner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinerTally {
    /// Seal type of the first block seen from this miner
    pub seal_type: SealType,
    pub blocks: u64,
}

/// Per-invocation reward accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardTally {
    pub miners: BTreeMap<Address, MinerTally>,
    pub total_pow: u64,
    pub total_pos: u64,
}

impl RewardTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one block
    pub fn record(&mut self, block: &BlockRecord) {
        self.miners
            .entry(block.miner.clone())
            .or_insert(MinerTally {
                seal_type: block.seal_type,
                blocks: 0,
            })
            .blocks += 1;

        match block.seal_type {
            SealType::Pow => self.total_pow += 1,
            SealType::Pos => self.total_pos += 1,
        }
    }

    /// All counted blocks
    pub fn total(&self) -> u64 {
        self.total_pow + self.total_pos
    }

    /// Percentage of all counted blocks, `None` when nothing was counted
    pub fn share(&self, blocks: u64) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(blocks as f64 / total as f64 * 100.0),
        }
    }

    /// Percentage of all counted blocks sealed by `miner`
    pub fn miner_share(&self, miner: &Address) -> Option<f64> {
        self.miners.get(miner).and_then(|m| self.share(m.blocks))
    }
}

/// Fold a batch of blocks into `tally`
pub fn tally_rewards(mut tally: RewardTally, blocks: &[BlockRecord]) -> RewardTally {
    for block in blocks {
        tally.record(block);
    }
    tally
}

fn percent(share: Option<f64>) -> String {
    match share {
        Some(s) => format!("{}%", s),
        None => "-1".to_string(),
    }
}

impl fmt::Display for RewardTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total pos: {} --- {}", self.total_pos, percent(self.share(self.total_pos)))?;
        writeln!(f, "total pow: {} --- {}", self.total_pow, percent(self.share(self.total_pow)))?;
        writeln!(f, "Miner\tType\tTotal Block\t%overall")?;
        for (miner, tally) in &self.miners {
            writeln!(
                f,
                "{}\t{}\t{}\t{}",
                miner,
                tally.seal_type,
                tally.blocks,
                percent(self.share(tally.blocks))
            )?;
        }
        Ok(())
    }
}
