//! Block time statistics
//!
//! Intervals are taken between consecutive blocks in height order. With a
//! seal filter, blocks of the other seal type are skipped and each interval
//! is measured from the previous block of the same seal type.

use std::fmt;

use super::{mean, or_sentinel, population_std_dev, round_to};
use crate::chain::{BlockRecord, SealType};

/// Mean and population standard deviation of block intervals (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTimeStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Number of intervals the statistics were computed over
    pub intervals: usize,
}

/// Block time statistics overall and per seal type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTimeReport {
    pub all: Option<BlockTimeStats>,
    pub pow: Option<BlockTimeStats>,
    pub pos: Option<BlockTimeStats>,
}

impl BlockTimeReport {
    pub fn from_blocks(blocks: &[BlockRecord]) -> Self {
        Self {
            all: block_time_stats(blocks, None),
            pow: block_time_stats(blocks, Some(SealType::Pow)),
            pos: block_time_stats(blocks, Some(SealType::Pos)),
        }
    }
}

/// Intervals between consecutive (matching) blocks
pub fn block_intervals(blocks: &[BlockRecord], seal_type: Option<SealType>) -> Vec<i64> {
    let mut ordered: Vec<&BlockRecord> = blocks
        .iter()
        .filter(|b| seal_type.map_or(true, |s| b.is_sealed_by(s)))
        .collect();
    ordered.sort_by_key(|b| b.number);

    ordered
        .windows(2)
        .map(|pair| pair[1].timestamp as i64 - pair[0].timestamp as i64)
        .collect()
}

/// Statistics rounded to two decimals, `None` when fewer than two blocks match
pub fn block_time_stats(blocks: &[BlockRecord], seal_type: Option<SealType>) -> Option<BlockTimeStats> {
    let intervals: Vec<f64> = block_intervals(blocks, seal_type)
        .into_iter()
        .map(|i| i as f64)
        .collect();

    Some(BlockTimeStats {
        mean: round_to(mean(&intervals)?, 2),
        std_dev: round_to(population_std_dev(&intervals)?, 2),
        intervals: intervals.len(),
    })
}

fn write_stats(f: &mut fmt::Formatter<'_>, label: &str, stats: &Option<BlockTimeStats>) -> fmt::Result {
    writeln!(
        f,
        "{}Block time statistics -> (Mean: {}, Std: {})",
        label,
        or_sentinel(stats.map(|s| s.mean)),
        or_sentinel(stats.map(|s| s.std_dev)),
    )
}

impl fmt::Display for BlockTimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stats(f, "", &self.all)?;
        write_stats(f, "Pow ", &self.pow)?;
        write_stats(f, "Pos ", &self.pos)
    }
}
