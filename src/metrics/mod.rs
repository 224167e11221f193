//! Metrics module - Pure reductions over fetched block records
//!
//! Nothing in here performs I/O. Each reduction takes the joined fetch
//! results and returns a summary value.

mod block_time;
mod difficulty;
mod latency;
mod orphans;
mod rewards;

pub use block_time::*;
pub use difficulty::*;
pub use latency::*;
pub use orphans::*;
pub use rewards::*;

/// Arithmetic mean, `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`), `None` for an empty sample
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Format an optional statistic to two decimals, printing `-1` when there
/// was no data
pub(crate) fn or_sentinel(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-1".to_string(),
    }
}
