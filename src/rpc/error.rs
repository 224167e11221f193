use thiserror::Error;

/// Errors raised while talking to a node
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Malformed response to {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Node error {code} on {method}: {message}")]
    Node {
        method: String,
        code: i64,
        message: String,
    },
    #[error("No result returned for {0}")]
    MissingResult(String),
    #[error("Block #{0} not found")]
    BlockNotFound(u64),
    #[error("Invalid hash {hash}: {source}")]
    Hash {
        hash: String,
        #[source]
        source: hex::FromHexError,
    },
}
