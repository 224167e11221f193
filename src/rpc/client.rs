//! Async JSON-RPC client for a single node
//!
//! One `NodeClient` per endpoint. Requests are independent; callers fan
//! them out and join on the results.

use log::debug;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chain::{deserialize_u64, to_quantity, BlockHash, BlockRecord};
use crate::rpc::error::RpcError;
use crate::rpc::methods::*;

/// HTTP JSON-RPC client bound to one node
#[derive(Debug)]
pub struct NodeClient {
    url: Url,
    http: Client,
    next_id: AtomicU64,
}

impl NodeClient {
    /// Create a client with its own connection pool
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a client sharing an existing HTTP connection pool
    pub fn with_client(http: Client, url: Url) -> Self {
        Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send a request and return the raw `result`, `None` when it was null
    pub async fn call_raw(&self, method: &str, params: Value) -> Result<Option<Value>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        debug!("[{}] {} {}", self.url, method, request.params);

        let body = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|source| self.http_error(source))?
            .text()
            .await
            .map_err(|source| self.http_error(source))?;

        let response: JsonRpcResponse =
            serde_json::from_str(&body).map_err(|source| RpcError::Decode {
                method: method.to_string(),
                source,
            })?;

        if let Some(error) = response.error {
            return Err(RpcError::Node {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    /// Send a request and decode a non-null `result`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let result = self
            .call_raw(method, params)
            .await?
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))?;
        decode(method, result)
    }

    /// Returns the latest block height
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self
            .call_raw(ETH_BLOCK_NUMBER, json!([]))
            .await?
            .ok_or_else(|| RpcError::MissingResult(ETH_BLOCK_NUMBER.to_string()))?;
        deserialize_u64(result).map_err(|source| RpcError::Decode {
            method: ETH_BLOCK_NUMBER.to_string(),
            source,
        })
    }

    /// Returns the block at `number`, without transaction bodies
    pub async fn block_by_number(&self, number: u64) -> Result<BlockRecord, RpcError> {
        let result = self
            .call_raw(ETH_GET_BLOCK_BY_NUMBER, json!([to_quantity(number), false]))
            .await?
            .ok_or(RpcError::BlockNotFound(number))?;
        decode(ETH_GET_BLOCK_BY_NUMBER, result)
    }

    /// Number of blocks the node has seen at `number`, canonical or not
    ///
    /// Relies on a node build that repurposes the transaction count call.
    pub async fn blocks_seen_at(&self, number: u64) -> Result<u64, RpcError> {
        let result = self
            .call_raw(ETH_GET_BLOCK_TRANSACTION_COUNT, json!([to_quantity(number)]))
            .await?
            .ok_or(RpcError::BlockNotFound(number))?;
        deserialize_u64(result).map_err(|source| RpcError::Decode {
            method: ETH_GET_BLOCK_TRANSACTION_COUNT.to_string(),
            source,
        })
    }

    /// Every Pow block hash the node has seen, oldest first
    pub async fn seen_pow_hashes(&self) -> Result<Vec<BlockHash>, RpcError> {
        self.hash_list(ETH_ACCOUNTS).await
    }

    /// Every Pos block hash the node has seen, oldest first
    pub async fn seen_pos_hashes(&self) -> Result<Vec<BlockHash>, RpcError> {
        self.hash_list(PERSONAL_LIST_ACCOUNTS).await
    }

    async fn hash_list(&self, method: &str) -> Result<Vec<BlockHash>, RpcError> {
        let raw: Vec<String> = self.call(method, json!([])).await?;
        raw.iter()
            .map(|s| {
                BlockHash::from_hex(s).map_err(|source| RpcError::Hash {
                    hash: s.clone(),
                    source,
                })
            })
            .collect()
    }

    fn http_error(&self, source: reqwest::Error) -> RpcError {
        RpcError::Http {
            url: self.url.to_string(),
            source,
        }
    }
}

impl fmt::Display for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.url)
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|source| RpcError::Decode {
        method: method.to_string(),
        source,
    })
}
