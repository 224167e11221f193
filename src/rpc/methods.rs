//! JSON-RPC 2.0 envelopes and the method names the collector calls

use serde::{Deserialize, Serialize};

/// Latest block height
pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
/// Block by height
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
/// Repurposed by the node to report how many blocks it has seen at a height
pub const ETH_GET_BLOCK_TRANSACTION_COUNT: &str = "eth_getBlockTransactionCountByNumber";
/// Repurposed by the node to list every Pow block hash it has seen
pub const ETH_ACCOUNTS: &str = "eth_accounts";
/// Repurposed by the node to list every Pos block hash it has seen
pub const PERSONAL_LIST_ACCOUNTS: &str = "personal_listAccounts";

/// JSON-RPC 2.0 Request
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC Error
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}
