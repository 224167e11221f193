//! Orphaned block rate
//!
//! Two ways of counting orphans:
//! - a per-height counter of every block the node has seen, canonical or not
//! - a scan of every sealed hash the node has seen, minus the canonical chain

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::chain::{BlockHash, BlockRange};

/// Orphan count derived from per-height "blocks seen" counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrphanCount {
    pub range: BlockRange,
    /// Canonical blocks in the range
    pub canonical: u64,
    /// All blocks seen at those heights
    pub seen: u64,
    pub orphans: u64,
    /// `orphans / canonical`, `None` for an empty range
    pub rate: Option<f64>,
}

/// Reduce per-height counters of blocks seen into an orphan count
pub fn orphan_count(range: BlockRange, seen_per_height: &[u64]) -> OrphanCount {
    let canonical = seen_per_height.len() as u64;
    let seen: u64 = seen_per_height.iter().sum();
    let orphans = seen.saturating_sub(canonical);
    let rate = if canonical > 0 {
        Some(orphans as f64 / canonical as f64)
    } else {
        None
    };

    OrphanCount {
        range,
        canonical,
        seen,
        orphans,
        rate,
    }
}

impl fmt::Display for OrphanCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block range: {}", self.range)?;
        writeln!(
            f,
            "{} orphaned blocks found in {} canonical blocks ({} seen)",
            self.orphans, self.canonical, self.seen
        )?;
        match self.rate {
            Some(rate) => writeln!(f, "orphaned block rate: {}", rate),
            None => writeln!(f, "orphaned block rate: -1"),
        }
    }
}

/// Orphans found by comparing seen hashes with the canonical chain
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanScan {
    pub canonical: usize,
    pub pow_orphans: Vec<BlockHash>,
    pub pos_orphans: Vec<BlockHash>,
}

impl OrphanScan {
    pub fn orphans(&self) -> usize {
        self.pow_orphans.len() + self.pos_orphans.len()
    }

    /// Orphans per canonical block
    pub fn rate(&self) -> Option<f64> {
        ratio(self.orphans(), self.canonical)
    }

    /// Fraction of orphans that were Pow blocks
    pub fn pow_fraction(&self) -> Option<f64> {
        ratio(self.pow_orphans.len(), self.orphans())
    }

    /// Fraction of orphans that were Pos blocks
    pub fn pos_fraction(&self) -> Option<f64> {
        ratio(self.pos_orphans.len(), self.orphans())
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Count orphans among the seen Pow and Pos hashes
///
/// `canonical` lists the canonical hashes of the range in height order.
/// Seen lists are in the node's insertion order.
pub fn scan_orphans(canonical: &[BlockHash], seen_pow: &[BlockHash], seen_pos: &[BlockHash]) -> OrphanScan {
    let canonical_set: HashSet<&BlockHash> = canonical.iter().collect();
    OrphanScan {
        canonical: canonical.len(),
        pow_orphans: orphans_in_span(canonical, &canonical_set, seen_pow),
        pos_orphans: orphans_in_span(canonical, &canonical_set, seen_pos),
    }
}

/// Trim `seen` to the span between the first and last canonical hash it
/// contains, then drop the canonical hashes
fn orphans_in_span(
    canonical: &[BlockHash],
    canonical_set: &HashSet<&BlockHash>,
    seen: &[BlockHash],
) -> Vec<BlockHash> {
    let mut position: HashMap<&BlockHash, usize> = HashMap::new();
    for (i, hash) in seen.iter().enumerate() {
        position.entry(hash).or_insert(i);
    }

    let first = canonical.iter().find_map(|h| position.get(h).copied());
    let last = canonical.iter().rev().find_map(|h| position.get(h).copied());

    match (first, last) {
        (Some(first), Some(last)) if first <= last => seen[first..=last]
            .iter()
            .filter(|h| !canonical_set.contains(h))
            .copied()
            .collect(),
        _ => Vec::new(),
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-1".to_string(),
    }
}

impl fmt::Display for OrphanScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Main chain blocks count: {}", self.canonical)?;
        writeln!(
            f,
            "Orphaned blocks count: {} POW: {} POS: {}",
            self.orphans(),
            self.pow_orphans.len(),
            self.pos_orphans.len()
        )?;
        writeln!(
            f,
            "Orphaned blocks rate: {} POW: {} POS: {}",
            fixed(self.rate(), 3),
            fixed(self.pow_fraction(), 2),
            fixed(self.pos_fraction(), 2)
        )
    }
}
