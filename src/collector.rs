//! Ranged block fetching
//!
//! Every fetch here issues all of its requests at once and joins them at a
//! single point. Results come back in height order regardless of which
//! request finished first. One failed request fails the whole batch.

use futures::future::try_join_all;
use log::info;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::chain::{BlockRange, BlockRecord};
use crate::metrics::{tally_rewards, RewardTally};
use crate::rpc::{NodeClient, RpcError};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("At least {needed} node endpoints required, {configured} configured")]
    NotEnoughNodes { needed: usize, configured: usize },
}

/// Clients for every configured endpoint, sharing one connection pool
#[derive(Debug)]
pub struct Collector {
    clients: Vec<NodeClient>,
}

impl Collector {
    pub fn new(nodes: &[Url]) -> Self {
        let http = Client::new();
        let clients = nodes
            .iter()
            .map(|url| NodeClient::with_client(http.clone(), url.clone()))
            .collect();
        Self { clients }
    }

    pub fn from_clients(clients: Vec<NodeClient>) -> Self {
        Self { clients }
    }

    pub fn clients(&self) -> &[NodeClient] {
        &self.clients
    }

    /// The first configured endpoint
    pub fn primary(&self) -> Result<&NodeClient, CollectError> {
        self.clients.first().ok_or(CollectError::NotEnoughNodes {
            needed: 1,
            configured: 0,
        })
    }

    /// The first two configured endpoints
    pub fn pair(&self) -> Result<(&NodeClient, &NodeClient), CollectError> {
        match self.clients.as_slice() {
            [a, b, ..] => Ok((a, b)),
            _ => Err(CollectError::NotEnoughNodes {
                needed: 2,
                configured: self.clients.len(),
            }),
        }
    }
}

/// Latest block height reported by `client`
pub async fn latest_height(client: &NodeClient) -> Result<u64, RpcError> {
    let latest = client.block_number().await?;
    info!("{} Latest block number: {}", client, latest);
    Ok(latest)
}

/// Fetch every block in `range` from one node
pub async fn fetch_range(client: &NodeClient, range: BlockRange) -> Result<Vec<BlockRecord>, RpcError> {
    info!("{} Fetching data from block {}", client, range);
    try_join_all(range.heights().map(|n| client.block_by_number(n))).await
}

/// Resolve a range against the node's head, then fetch it
pub async fn fetch_window<F>(
    client: &NodeClient,
    resolve: F,
) -> Result<(BlockRange, Vec<BlockRecord>), RpcError>
where
    F: FnOnce(u64) -> BlockRange,
{
    let range = resolve(latest_height(client).await?);
    if range.is_empty() {
        info!("{} Empty block range {}", client, range);
    }
    let blocks = fetch_range(client, range).await?;
    Ok((range, blocks))
}

/// Blocks after `fork_block` up to the node's head
pub async fn fetch_since_fork(
    client: &NodeClient,
    fork_block: u64,
) -> Result<(BlockRange, Vec<BlockRecord>), RpcError> {
    fetch_window(client, |latest| BlockRange::after(fork_block, latest)).await
}

/// One reward tally per node in client order, each over a range resolved
/// against that node's own head
pub async fn fetch_rewards_per_node<F>(
    clients: &[NodeClient],
    resolve: F,
) -> Result<Vec<RewardTally>, RpcError>
where
    F: Fn(u64) -> BlockRange + Copy,
{
    try_join_all(clients.iter().map(|client| async move {
        let (_, blocks) = fetch_window(client, resolve).await?;
        Ok::<_, RpcError>(tally_rewards(RewardTally::new(), &blocks))
    }))
    .await
}

/// Fetch `range` from every node, one `Vec` per node in client order
pub async fn fetch_range_per_node(
    clients: &[NodeClient],
    range: BlockRange,
) -> Result<Vec<Vec<BlockRecord>>, RpcError> {
    try_join_all(clients.iter().map(|client| fetch_range(client, range))).await
}

/// Fetch `range` from every node and group the observations by height
pub async fn fetch_observations(
    clients: &[NodeClient],
    range: BlockRange,
) -> Result<Vec<Vec<BlockRecord>>, RpcError> {
    let per_node = fetch_range_per_node(clients, range).await?;
    Ok(group_by_height(per_node))
}

/// Turn per-node block lists into per-height observation lists
///
/// Every inner list of `per_node` covers the same heights in the same order.
pub fn group_by_height(per_node: Vec<Vec<BlockRecord>>) -> Vec<Vec<BlockRecord>> {
    let heights = per_node.iter().map(Vec::len).min().unwrap_or(0);
    let mut by_height: Vec<Vec<BlockRecord>> = (0..heights)
        .map(|_| Vec::with_capacity(per_node.len()))
        .collect();

    for blocks in per_node {
        for (slot, block) in by_height.iter_mut().zip(blocks) {
            slot.push(block);
        }
    }
    by_height
}

/// Blocks seen per height (canonical and orphaned) according to one node
pub async fn fetch_blocks_seen(client: &NodeClient, range: BlockRange) -> Result<Vec<u64>, RpcError> {
    info!("{} Counting blocks seen from block {}", client, range);
    try_join_all(range.heights().map(|n| client.blocks_seen_at(n))).await
}

/// Same-height blocks from two nodes, over a range resolved against the
/// lower of the two heads
pub async fn fetch_chain_pair<F>(
    a: &NodeClient,
    b: &NodeClient,
    resolve: F,
) -> Result<(BlockRange, Vec<BlockRecord>, Vec<BlockRecord>), RpcError>
where
    F: FnOnce(u64) -> BlockRange,
{
    let (head_a, head_b) = futures::try_join!(latest_height(a), latest_height(b))?;
    let range = resolve(head_a.min(head_b));
    let (blocks_a, blocks_b) = futures::try_join!(fetch_range(a, range), fetch_range(b, range))?;
    Ok((range, blocks_a, blocks_b))
}
