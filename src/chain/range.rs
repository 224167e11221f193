//! Closed block range resolution
//!
//! Explicit bounds come from the command line; missing bounds default to a
//! trailing window ending at the latest known height.

use std::fmt;
use std::ops::RangeInclusive;

/// Closed range of block heights. Empty when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Resolve requested bounds against the chain head
    ///
    /// # Arguments
    /// * `latest` - Latest known block height
    /// * `start` - Requested first block, defaults to `latest - window + 1`
    /// * `end` - Requested last block, defaults to `latest`
    /// * `window` - Trailing window size used for the default start
    /// * `floor` - Lowest height that may be fetched
    pub fn resolve(
        latest: u64,
        start: Option<u64>,
        end: Option<u64>,
        window: u64,
        floor: u64,
    ) -> Self {
        let start = start
            .unwrap_or_else(|| latest.saturating_add(1).saturating_sub(window))
            .max(floor);
        let end = end.unwrap_or(latest).min(latest);
        Self { start, end }
    }

    /// Heights strictly after `block` up to `latest`
    pub fn after(block: u64, latest: u64) -> Self {
        Self {
            start: block.saturating_add(1),
            end: latest,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of heights covered
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn heights(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} to #{}", self.start, self.end)
    }
}
