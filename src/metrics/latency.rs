//! Cross-node block import latency
//!
//! For each height, every node's import time is compared with the earliest
//! import of that block among all nodes. The earliest node contributes a
//! zero latency but is not counted in the average.

use log::warn;
use std::fmt;

use crate::chain::BlockRecord;

/// Import latency of one block height
#[derive(Debug, Clone, PartialEq)]
pub struct HeightLatency {
    pub number: u64,
    /// Import delay of each observation relative to the earliest (ms)
    pub latencies: Vec<u64>,
    /// Rounded average over the non-earliest observations, `None` with one observer
    pub average: Option<u64>,
}

/// Reduce the observations of one height
///
/// Observations without an import timestamp are ignored.
pub fn height_latency(number: u64, observations: &[BlockRecord]) -> HeightLatency {
    let imports: Vec<u64> = observations
        .iter()
        .filter_map(|b| {
            if b.import_timestamp.is_none() {
                warn!("Block #{} observation has no import timestamp", b.number);
            }
            b.import_timestamp
        })
        .collect();

    let earliest = imports.iter().copied().min().unwrap_or(0);
    let latencies: Vec<u64> = imports.iter().map(|t| t - earliest).collect();

    let average = if latencies.len() > 1 {
        let total: u64 = latencies.iter().sum();
        Some((total as f64 / (latencies.len() - 1) as f64).round() as u64)
    } else {
        None
    };

    HeightLatency {
        number,
        latencies,
        average,
    }
}

/// Running network-wide latency: unweighted mean of per-height averages
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyTracker {
    pub average: Option<f64>,
    pub heights: u64,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one height into the running average; heights without an average are skipped
    pub fn record(mut self, height: &HeightLatency) -> Self {
        if let Some(sample) = height.average {
            let prior = self.average.unwrap_or(0.0);
            let n = self.heights as f64;
            self.average = Some((prior * n + sample as f64) / (n + 1.0));
            self.heights += 1;
        }
        self
    }
}

/// Per-height latencies and the network-wide average
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReport {
    pub heights: Vec<HeightLatency>,
    pub network: LatencyTracker,
}

impl LatencyReport {
    /// Build from observations grouped by height (one inner list per height)
    pub fn from_observations(by_height: &[Vec<BlockRecord>]) -> Self {
        let heights: Vec<HeightLatency> = by_height
            .iter()
            .filter_map(|observations| {
                observations
                    .first()
                    .map(|first| height_latency(first.number, observations))
            })
            .collect();

        let network = heights
            .iter()
            .fold(LatencyTracker::new(), |tracker, h| tracker.record(h));

        Self { heights, network }
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for height in &self.heights {
            match height.average {
                Some(avg) => writeln!(f, "block {} average import latency: {} ms", height.number, avg)?,
                None => writeln!(f, "block {} average import latency: -1 ms", height.number)?,
            }
        }
        match self.network.average {
            Some(avg) => writeln!(
                f,
                "network average import latency: {:.2} ms over {} blocks",
                avg, self.network.heights
            ),
            None => writeln!(f, "network average import latency: -1 ms"),
        }
    }
}
