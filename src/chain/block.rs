//! Block record as returned by `eth_getBlockByNumber`
//!
//! Only the fields the metrics read are decoded. Records are immutable
//! snapshots of what one node reported at fetch time.

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

use super::hash::{Address, BlockHash};
use super::quantity::{deserialize_opt_u64, deserialize_u128, deserialize_u256, deserialize_u64};

/// Consensus mechanism that sealed a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SealType {
    /// Proof of work
    Pow,
    /// Proof of stake
    Pos,
}

impl SealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SealType::Pow => "Pow",
            SealType::Pos => "Pos",
        }
    }
}

impl fmt::Display for SealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pow" => Ok(SealType::Pow),
            "pos" => Ok(SealType::Pos),
            other => Err(format!("Unknown seal type: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for SealType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A block as observed by one node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    /// Block height
    #[serde(deserialize_with = "deserialize_u64")]
    pub number: u64,
    /// Block timestamp (seconds)
    #[serde(deserialize_with = "deserialize_u64")]
    pub timestamp: u64,
    /// Local time the reporting node imported the block (milliseconds)
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    pub import_timestamp: Option<u64>,
    pub seal_type: SealType,
    #[serde(deserialize_with = "deserialize_u128")]
    pub difficulty: u128,
    /// Cumulative difficulty as reported by the node, up to 256 bits wide
    #[serde(deserialize_with = "deserialize_u256")]
    pub total_difficulty: U256,
    pub miner: Address,
    pub hash: BlockHash,
}

impl BlockRecord {
    pub fn is_sealed_by(&self, seal_type: SealType) -> bool {
        self.seal_type == seal_type
    }
}
