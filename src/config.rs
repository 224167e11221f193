//! Runtime configuration
//!
//! Read from the process environment; the binary loads `.env` into it
//! first. Command line flags override individual values.

use reqwest::Url;
use thiserror::Error;

use crate::constants::{
    DEFAULT_DIFFICULTY_WINDOW, DEFAULT_NODE_URL, DEFAULT_ORPHAN_WINDOW, DEFAULT_WINDOW,
};

pub const NODES_VAR: &str = "KPI_NODES";
pub const WINDOW_VAR: &str = "KPI_WINDOW";
pub const DIFFICULTY_WINDOW_VAR: &str = "KPI_DIFFICULTY_WINDOW";
pub const ORPHAN_WINDOW_VAR: &str = "KPI_ORPHAN_WINDOW";
/// Name reported for an invalid `--window` flag
pub const WINDOW_FLAG: &str = "--window";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid node URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("No node endpoints configured")]
    NoNodes,
    #[error("Invalid value for {var}: {value}")]
    InvalidWindow { var: &'static str, value: String },
}

/// Endpoints and window sizes for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub nodes: Vec<Url>,
    pub window: u64,
    pub difficulty_window: u64,
    pub orphan_window: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodes: vec![Url::parse(DEFAULT_NODE_URL).expect("default node URL is valid")],
            window: DEFAULT_WINDOW,
            difficulty_window: DEFAULT_DIFFICULTY_WINDOW,
            orphan_window: DEFAULT_ORPHAN_WINDOW,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(NODES_VAR) {
            config.nodes = parse_nodes(&raw)?;
        }
        if let Some(raw) = lookup(WINDOW_VAR) {
            config.window = parse_window(WINDOW_VAR, &raw)?;
        }
        if let Some(raw) = lookup(DIFFICULTY_WINDOW_VAR) {
            config.difficulty_window = parse_window(DIFFICULTY_WINDOW_VAR, &raw)?;
        }
        if let Some(raw) = lookup(ORPHAN_WINDOW_VAR) {
            config.orphan_window = parse_window(ORPHAN_WINDOW_VAR, &raw)?;
        }

        Ok(config)
    }

    /// Replace the endpoint list when the command line gave one
    pub fn with_nodes(mut self, nodes: &[String]) -> Result<Self, ConfigError> {
        if !nodes.is_empty() {
            self.nodes = nodes
                .iter()
                .map(|n| parse_url(n))
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(self)
    }

    /// Replace the trailing window when the command line gave one
    pub fn with_window(mut self, window: Option<u64>) -> Result<Self, ConfigError> {
        if let Some(window) = window {
            self.window = check_window(WINDOW_FLAG, window)?;
        }
        Ok(self)
    }
}

/// Parse a comma separated endpoint list, ignoring blank entries
pub fn parse_nodes(raw: &str) -> Result<Vec<Url>, ConfigError> {
    let nodes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_url)
        .collect::<Result<Vec<_>, _>>()?;

    if nodes.is_empty() {
        return Err(ConfigError::NoNodes);
    }
    Ok(nodes)
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn parse_window(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let window = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidWindow {
        var,
        value: raw.to_string(),
    })?;
    check_window(var, window)
}

fn check_window(var: &'static str, window: u64) -> Result<u64, ConfigError> {
    if window == 0 {
        return Err(ConfigError::InvalidWindow {
            var,
            value: window.to_string(),
        });
    }
    Ok(window)
}
