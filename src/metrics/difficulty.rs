//! Total difficulty accumulation
//!
//! Pow and Pos difficulties are summed separately, each sum seeded with
//! `DIFFICULTY_SEED`. The chain's total difficulty after a block is the
//! product of the two sums.

use std::fmt;

use crate::chain::{BlockRange, BlockRecord, SealType, U256};
use crate::constants::DIFFICULTY_SEED;

/// Running Pow and Pos difficulty sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyAccumulator {
    pub pow: u128,
    pub pos: u128,
}

impl Default for DifficultyAccumulator {
    fn default() -> Self {
        Self {
            pow: DIFFICULTY_SEED,
            pos: DIFFICULTY_SEED,
        }
    }
}

impl DifficultyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one block's difficulty to the sum of its seal type
    pub fn add(&mut self, block: &BlockRecord) {
        match block.seal_type {
            SealType::Pow => self.pow = self.pow.saturating_add(block.difficulty),
            SealType::Pos => self.pos = self.pos.saturating_add(block.difficulty),
        }
    }

    /// Product of both sums, saturating at `u128::MAX`
    pub fn total(&self) -> u128 {
        self.pow.saturating_mul(self.pos)
    }
}

/// Total difficulty right after one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyPoint {
    pub number: u64,
    pub timestamp: u64,
    pub seal_type: SealType,
    pub total: u128,
}

/// Accumulate from a fresh seed over `blocks` in the given order
pub fn accumulate_difficulty(blocks: &[BlockRecord]) -> Vec<DifficultyPoint> {
    let mut acc = DifficultyAccumulator::new();
    blocks
        .iter()
        .map(|block| {
            acc.add(block);
            DifficultyPoint {
                number: block.number,
                timestamp: block.timestamp,
                seal_type: block.seal_type,
                total: acc.total(),
            }
        })
        .collect()
}

fn write_points(f: &mut fmt::Formatter<'_>, points: &[DifficultyPoint]) -> fmt::Result {
    for p in points {
        writeln!(f, "{} {} {}", p.timestamp, p.total, p.seal_type)?;
    }
    Ok(())
}

/// Accumulated total difficulty over a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultySeries {
    pub range: BlockRange,
    pub points: Vec<DifficultyPoint>,
}

impl DifficultySeries {
    pub fn from_blocks(range: BlockRange, blocks: &[BlockRecord]) -> Self {
        Self {
            range,
            points: accumulate_difficulty(blocks),
        }
    }
}

impl fmt::Display for DifficultySeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total difficulty ({}):", self.range)?;
        write_points(f, &self.points)
    }
}

/// Where two same-height block lists stop agreeing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPoint {
    /// Every compared height has the same hash
    Identical,
    /// Hashes differ; `last_common` is the index before the first mismatch,
    /// `None` when the very first block already differs
    Diverged { last_common: Option<usize> },
}

impl ForkPoint {
    /// Index where accumulation restarts from the seed
    pub fn restart_index(&self) -> usize {
        match self {
            ForkPoint::Identical => 0,
            ForkPoint::Diverged { last_common } => last_common.map_or(0, |i| i + 1),
        }
    }
}

/// Compare hashes index by index
pub fn find_fork(a: &[BlockRecord], b: &[BlockRecord]) -> ForkPoint {
    match a.iter().zip(b).position(|(x, y)| x.hash != y.hash) {
        None => ForkPoint::Identical,
        Some(i) => ForkPoint::Diverged {
            last_common: i.checked_sub(1),
        },
    }
}

/// Total difficulty of two competing chains after their fork point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkComparison {
    pub range: BlockRange,
    pub fork: ForkPoint,
    pub chain_a: Vec<DifficultyPoint>,
    pub chain_b: Vec<DifficultyPoint>,
}

impl ForkComparison {
    pub fn from_chains(range: BlockRange, a: &[BlockRecord], b: &[BlockRecord]) -> Self {
        let fork = find_fork(a, b);
        let restart = fork.restart_index();
        Self {
            range,
            fork,
            chain_a: accumulate_difficulty(a.get(restart..).unwrap_or_default()),
            chain_b: accumulate_difficulty(b.get(restart..).unwrap_or_default()),
        }
    }

    /// Height of the last block both chains share
    pub fn last_common_height(&self) -> Option<u64> {
        match self.fork {
            ForkPoint::Identical => None,
            ForkPoint::Diverged { last_common } => {
                last_common.map(|i| self.range.start + i as u64)
            }
        }
    }
}

impl fmt::Display for ForkComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fork {
            ForkPoint::Identical => writeln!(f, "No fork in block range {}", self.range)?,
            ForkPoint::Diverged { last_common: Some(i) } => writeln!(
                f,
                "Last common block: {} (#{})",
                i,
                self.range.start + i as u64
            )?,
            ForkPoint::Diverged { last_common: None } => writeln!(f, "Last common block: -1")?,
        }
        writeln!(f, "Total difficulty (chain 1):")?;
        write_points(f, &self.chain_a)?;
        writeln!(f, "Total difficulty (chain 2):")?;
        write_points(f, &self.chain_b)
    }
}

/// Block difficulties split by seal type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifficultyListing {
    /// `(number, difficulty)` of Pow blocks in height order
    pub pow: Vec<(u64, u128)>,
    /// `(number, difficulty)` of Pos blocks in height order
    pub pos: Vec<(u64, u128)>,
}

pub fn difficulty_listing(blocks: &[BlockRecord]) -> DifficultyListing {
    let mut ordered: Vec<&BlockRecord> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.number);

    let mut listing = DifficultyListing::default();
    for block in ordered {
        let entry = (block.number, block.difficulty);
        match block.seal_type {
            SealType::Pow => listing.pow.push(entry),
            SealType::Pos => listing.pos.push(entry),
        }
    }
    listing
}

impl fmt::Display for DifficultyListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Proof-of-work difficulty")?;
        for (number, difficulty) in &self.pow {
            writeln!(f, "{},{}", number, difficulty)?;
        }
        writeln!(f, "Proof-of-stake difficulty")?;
        for (number, difficulty) in &self.pos {
            writeln!(f, "{},{}", number, difficulty)?;
        }
        Ok(())
    }
}

/// Node-reported total difficulty per block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedDifficulty {
    /// `(number, timestamp, total_difficulty)` in height order
    pub points: Vec<(u64, u64, U256)>,
}

impl ReportedDifficulty {
    pub fn from_blocks(blocks: &[BlockRecord]) -> Self {
        let mut points: Vec<(u64, u64, U256)> = blocks
            .iter()
            .map(|b| (b.number, b.timestamp, b.total_difficulty))
            .collect();
        points.sort_by_key(|p| p.0);
        Self { points }
    }
}

impl fmt::Display for ReportedDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total difficulty:")?;
        for (number, timestamp, total) in &self.points {
            writeln!(f, "{},{},{}", number, timestamp, total)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fixtures::{forked_record, record};

    fn with_difficulty(mut block: BlockRecord, difficulty: u128) -> BlockRecord {
        block.difficulty = difficulty;
        block
    }

    #[test]
    fn test_accumulator_seeded_product() {
        let blocks = vec![
            with_difficulty(record(1, 10, SealType::Pow), 4),
            with_difficulty(record(2, 20, SealType::Pos), 2),
            with_difficulty(record(3, 30, SealType::Pow), 5),
        ];
        let totals: Vec<u128> = accumulate_difficulty(&blocks).iter().map(|p| p.total).collect();
        // (1+4)*1, (1+4)*(1+2), (1+4+5)*(1+2)
        assert_eq!(totals, vec![5, 15, 30]);
    }

    #[test]
    fn test_accumulator_saturates() {
        let mut acc = DifficultyAccumulator::new();
        acc.add(&with_difficulty(record(1, 0, SealType::Pow), u128::MAX));
        acc.add(&with_difficulty(record(2, 0, SealType::Pos), u128::MAX));
        assert_eq!(acc.pow, u128::MAX);
        assert_eq!(acc.total(), u128::MAX);
    }

    fn two_chains(len: u64, diverge_at: Option<u64>) -> (Vec<BlockRecord>, Vec<BlockRecord>) {
        let a = (0..len)
            .map(|i| forked_record(100 + i, i * 10, SealType::Pow, 0))
            .collect();
        let b = (0..len)
            .map(|i| {
                let fork = match diverge_at {
                    Some(d) if i >= d => 1,
                    _ => 0,
                };
                forked_record(100 + i, i * 10, SealType::Pow, fork)
            })
            .collect();
        (a, b)
    }

    #[test]
    fn test_fork_at_index_ten() {
        let (a, b) = two_chains(15, Some(10));
        let range = BlockRange::new(100, 114);
        let cmp = ForkComparison::from_chains(range, &a, &b);

        assert_eq!(cmp.fork, ForkPoint::Diverged { last_common: Some(9) });
        assert_eq!(cmp.last_common_height(), Some(109));
        assert_eq!(cmp.chain_a.len(), 5);
        assert_eq!(cmp.chain_a[0].number, 110);
        // Restarted from the (1, 1) seed: (1 + 1) * 1
        assert_eq!(cmp.chain_a[0].total, 2);
        assert_eq!(cmp.chain_b[0].total, 2);
        assert!(cmp.to_string().contains("Last common block: 9 (#109)"));
    }

    #[test]
    fn test_fork_at_first_block() {
        let (a, b) = two_chains(3, Some(0));
        let cmp = ForkComparison::from_chains(BlockRange::new(100, 102), &a, &b);
        assert_eq!(cmp.fork, ForkPoint::Diverged { last_common: None });
        assert_eq!(cmp.chain_a.len(), 3);
        assert!(cmp.to_string().contains("Last common block: -1"));
    }

    #[test]
    fn test_identical_chains_accumulate_whole_range() {
        let (a, b) = two_chains(4, None);
        let cmp = ForkComparison::from_chains(BlockRange::new(100, 103), &a, &b);
        assert_eq!(cmp.fork, ForkPoint::Identical);
        assert_eq!(cmp.last_common_height(), None);
        assert_eq!(cmp.chain_b.len(), 4);
        assert_eq!(cmp.chain_b[3].total, 5);
    }

    #[test]
    fn test_empty_chains() {
        let cmp = ForkComparison::from_chains(BlockRange::new(5, 4), &[], &[]);
        assert_eq!(cmp.fork, ForkPoint::Identical);
        assert!(cmp.chain_a.is_empty());
    }

    #[test]
    fn test_listing_split_by_seal() {
        let blocks = vec![
            with_difficulty(record(3, 0, SealType::Pos), 30),
            with_difficulty(record(1, 0, SealType::Pow), 10),
            with_difficulty(record(2, 0, SealType::Pow), 20),
        ];
        let listing = difficulty_listing(&blocks);
        assert_eq!(listing.pow, vec![(1, 10), (2, 20)]);
        assert_eq!(listing.pos, vec![(3, 30)]);
        assert_eq!(
            listing.to_string(),
            "Proof-of-work difficulty\n1,10\n2,20\nProof-of-stake difficulty\n3,30\n"
        );
    }

    #[test]
    fn test_reported_series() {
        let blocks = vec![record(2, 20, SealType::Pow), record(1, 10, SealType::Pos)];
        let series = ReportedDifficulty::from_blocks(&blocks);
        assert_eq!(
            series.points,
            vec![(1, 10, U256::from(1u64)), (2, 20, U256::from(2u64))]
        );
    }
}
