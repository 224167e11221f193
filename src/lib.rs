//! Chain KPI Library
//!
//! Polls blockchain nodes over JSON-RPC for ranges of recent blocks and
//! reduces them into block time, import latency, reward distribution,
//! orphan rate and total difficulty statistics.

pub mod chain;
pub mod collector;
pub mod config;
pub mod metrics;
pub mod rpc;

/// Default values used when neither the environment nor the CLI sets them
pub mod constants {
    /// Number of trailing blocks fetched when no explicit range is given
    pub const DEFAULT_WINDOW: u64 = 100;

    /// Trailing window for the per-seal difficulty listing
    pub const DEFAULT_DIFFICULTY_WINDOW: u64 = 128;

    /// Trailing window for the orphan counter
    pub const DEFAULT_ORPHAN_WINDOW: u64 = 1000;

    /// Lowest block fetched by range metrics (genesis is skipped)
    pub const RANGE_FLOOR: u64 = 1;

    /// Lowest block fetched by the orphan counter
    pub const ORPHAN_RANGE_FLOOR: u64 = 0;

    /// Seed of both the Pow and Pos difficulty sums
    pub const DIFFICULTY_SEED: u128 = 1;

    /// Endpoint used when none is configured
    pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:9001";
}
