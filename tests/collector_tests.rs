//! Collector tests against mock JSON-RPC nodes

use chain_kpi::chain::{Address, BlockHash, BlockRange, SealType, U256};
use chain_kpi::collector::{
    fetch_blocks_seen, fetch_chain_pair, fetch_observations, fetch_range, fetch_rewards_per_node,
    fetch_since_fork, latest_height, Collector,
};
use chain_kpi::metrics::{
    block_time_stats, orphan_count, DifficultySeries, ForkComparison, ForkPoint, LatencyReport,
};
use chain_kpi::rpc::{NodeClient, RpcError};
use mockito::{Matcher, Mock, ServerGuard};
use reqwest::Url;
use serde_json::{json, Value};

fn hash_hex(number: u64, fork: u8) -> String {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&number.to_be_bytes());
    hash[31] = fork;
    format!("0x{}", hex::encode(hash))
}

fn block_json(number: u64, timestamp: u64, seal: &str, fork: u8, import: Option<u64>) -> Value {
    let mut block = json!({
        "number": format!("0x{:x}", number),
        "timestamp": format!("0x{:x}", timestamp),
        "sealType": seal,
        "difficulty": "0x2",
        "totalDifficulty": format!("0x{:x}", number * 2),
        "miner": "0xA00a2D0D10ce8a2EA47A76fBb935405df2a12b0e2BC932F188F84b5f16da9C2C",
        "hash": hash_hex(number, fork),
    });
    if let Some(t) = import {
        block["importTimestamp"] = json!(t);
    }
    block
}

fn client(server: &ServerGuard) -> NodeClient {
    NodeClient::new(Url::parse(&server.url()).unwrap())
}

async fn mock_result(server: &mut ServerGuard, method: &str, params: Option<Value>, result: Value) -> Mock {
    let mut matcher = json!({ "method": method });
    if let Some(params) = params {
        matcher["params"] = params;
    }
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(matcher))
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
        .create_async()
        .await
}

async fn mock_head(server: &mut ServerGuard, latest: u64) -> Mock {
    mock_result(server, "eth_blockNumber", None, json!(format!("0x{:x}", latest))).await
}

async fn mock_block(server: &mut ServerGuard, block: Value) -> Mock {
    let number = block["number"].clone();
    mock_result(server, "eth_getBlockByNumber", Some(json!([number, false])), block).await
}

#[tokio::test]
async fn test_latest_height() {
    let mut server = mockito::Server::new_async().await;
    let head = mock_head(&mut server, 0x1f4).await;

    let latest = latest_height(&client(&server)).await.unwrap();
    assert_eq!(latest, 500);
    head.assert_async().await;
}

#[tokio::test]
async fn test_fetch_range_in_height_order() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (n, ts) in [(1, 100), (2, 105), (3, 111)] {
        mocks.push(mock_block(&mut server, block_json(n, ts, "Pow", 0, None)).await);
    }

    let blocks = fetch_range(&client(&server), BlockRange::new(1, 3)).await.unwrap();
    let numbers: Vec<u64> = blocks.iter().map(|b| b.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(blocks[2].timestamp, 111);
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_total_difficulty_wider_than_u128() {
    let mut server = mockito::Server::new_async().await;
    let mut wide = block_json(2, 105, "Pos", 0, None);
    wide["totalDifficulty"] = json!("0x400000000000000000000000000000000");
    let _one = mock_block(&mut server, block_json(1, 100, "Pow", 0, None)).await;
    let _two = mock_block(&mut server, wide).await;

    let blocks = fetch_range(&client(&server), BlockRange::new(1, 2)).await.unwrap();
    assert_eq!(blocks[1].total_difficulty, U256::from(u128::MAX) + U256::one());

    let stats = block_time_stats(&blocks, None).unwrap();
    assert_eq!(stats.mean, 5.0);
}

#[tokio::test]
async fn test_empty_range_sends_nothing() {
    let server = mockito::Server::new_async().await;
    let blocks = fetch_range(&client(&server), BlockRange::new(10, 9)).await.unwrap();
    assert!(blocks.is_empty());
}

#[tokio::test]
async fn test_missing_block_fails_batch() {
    let mut server = mockito::Server::new_async().await;
    let _one = mock_block(&mut server, block_json(1, 100, "Pow", 0, None)).await;
    let _two = mock_result(
        &mut server,
        "eth_getBlockByNumber",
        Some(json!(["0x2", false])),
        Value::Null,
    )
    .await;

    let err = fetch_range(&client(&server), BlockRange::new(1, 2)).await.unwrap_err();
    assert!(matches!(err, RpcError::BlockNotFound(2)));
}

#[tokio::test]
async fn test_node_error_propagates() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32601, "message": "Method not found" }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server).block_number().await.unwrap_err();
    match err {
        RpcError::Node { code, message, .. } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_body("not json")
        .create_async()
        .await;

    let err = client(&server).block_number().await.unwrap_err();
    assert!(matches!(err, RpcError::Decode { .. }));
}

#[tokio::test]
async fn test_latency_across_nodes() {
    let mut fast = mockito::Server::new_async().await;
    let mut slow = mockito::Server::new_async().await;
    let _f1 = mock_block(&mut fast, block_json(1, 100, "Pow", 0, Some(1_000))).await;
    let _f2 = mock_block(&mut fast, block_json(2, 110, "Pos", 0, Some(2_000))).await;
    let _s1 = mock_block(&mut slow, block_json(1, 100, "Pow", 0, Some(1_040))).await;
    let _s2 = mock_block(&mut slow, block_json(2, 110, "Pos", 0, Some(2_020))).await;

    let collector = Collector::from_clients(vec![client(&fast), client(&slow)]);
    let observations = fetch_observations(collector.clients(), BlockRange::new(1, 2))
        .await
        .unwrap();
    assert_eq!(observations.len(), 2);

    let report = LatencyReport::from_observations(&observations);
    assert_eq!(report.heights[0].average, Some(40));
    assert_eq!(report.heights[1].average, Some(20));
    assert_eq!(report.network.average, Some(30.0));
}

#[tokio::test]
async fn test_fork_between_two_nodes() {
    let mut node_a = mockito::Server::new_async().await;
    let mut node_b = mockito::Server::new_async().await;
    // Node B is one block ahead; the comparison stops at the lower head
    let _ha = mock_head(&mut node_a, 4).await;
    let _hb = mock_head(&mut node_b, 5).await;

    let mut mocks = Vec::new();
    for n in 1..=4u64 {
        let fork_b = u8::from(n >= 3);
        mocks.push(mock_block(&mut node_a, block_json(n, n * 10, "Pow", 0, None)).await);
        mocks.push(mock_block(&mut node_b, block_json(n, n * 10, "Pos", fork_b, None)).await);
    }

    let a = client(&node_a);
    let b = client(&node_b);
    let (range, chain_a, chain_b) =
        fetch_chain_pair(&a, &b, |latest| BlockRange::resolve(latest, None, None, 100, 1))
            .await
            .unwrap();
    assert_eq!(range, BlockRange::new(1, 4));

    let cmp = ForkComparison::from_chains(range, &chain_a, &chain_b);
    assert_eq!(cmp.fork, ForkPoint::Diverged { last_common: Some(1) });
    assert_eq!(cmp.last_common_height(), Some(2));
    // Chain A restarts with two Pow blocks of difficulty 2: (1+2)*1, (1+4)*1
    let totals_a: Vec<u128> = cmp.chain_a.iter().map(|p| p.total).collect();
    assert_eq!(totals_a, vec![3, 5]);
    // Chain B restarts with two Pos blocks: 1*(1+2), 1*(1+4)
    assert!(cmp.chain_b.iter().all(|p| p.seal_type == SealType::Pos));
    assert_eq!(cmp.chain_b[1].total, 5);
}

#[tokio::test]
async fn test_orphan_counter() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (n, seen) in [(0u64, 1u64), (1, 3), (2, 1), (3, 2)] {
        mocks.push(
            mock_result(
                &mut server,
                "eth_getBlockTransactionCountByNumber",
                Some(json!([format!("0x{:x}", n)])),
                json!(format!("0x{:x}", seen)),
            )
            .await,
        );
    }

    let range = BlockRange::new(0, 3);
    let seen = fetch_blocks_seen(&client(&server), range).await.unwrap();
    assert_eq!(seen, vec![1, 3, 1, 2]);

    let count = orphan_count(range, &seen);
    assert_eq!(count.orphans, 3);
    assert_eq!(count.rate, Some(0.75));
}

#[tokio::test]
async fn test_seen_hash_lists() {
    let mut server = mockito::Server::new_async().await;
    let upper = hash_hex(7, 0).to_uppercase().replacen("0X", "0x", 1);
    let _pow = mock_result(&mut server, "eth_accounts", None, json!([upper, hash_hex(8, 1)])).await;
    let _pos = mock_result(&mut server, "personal_listAccounts", None, json!([])).await;

    let node = client(&server);
    let pow = node.seen_pow_hashes().await.unwrap();
    let pos = node.seen_pos_hashes().await.unwrap();
    assert_eq!(pow[0], BlockHash::from_hex(&hash_hex(7, 0)).unwrap());
    assert_eq!(pow.len(), 2);
    assert!(pos.is_empty());
}

#[tokio::test]
async fn test_invalid_seen_hash() {
    let mut server = mockito::Server::new_async().await;
    let _pow = mock_result(&mut server, "eth_accounts", None, json!(["0x1234"])).await;

    let err = client(&server).seen_pow_hashes().await.unwrap_err();
    assert!(matches!(err, RpcError::Hash { .. }));
}

#[tokio::test]
async fn test_since_fork_runs_to_head() {
    let mut server = mockito::Server::new_async().await;
    let _head = mock_head(&mut server, 4).await;
    let mut mocks = Vec::new();
    for n in 3..=4u64 {
        mocks.push(mock_block(&mut server, block_json(n, n * 10, "Pow", 0, None)).await);
    }

    let (range, blocks) = fetch_since_fork(&client(&server), 2).await.unwrap();
    assert_eq!(range, BlockRange::new(3, 4));

    let series = DifficultySeries::from_blocks(range, &blocks);
    let totals: Vec<u128> = series.points.iter().map(|p| p.total).collect();
    // Seeded at (1, 1) with two Pow blocks of difficulty 2
    assert_eq!(totals, vec![3, 5]);
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_since_fork_at_head_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _head = mock_head(&mut server, 4).await;
    let blocks_requested = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": "eth_getBlockByNumber" })))
        .expect(0)
        .create_async()
        .await;

    let node = client(&server);
    for fork_block in [4, 9] {
        let (range, blocks) = fetch_since_fork(&node, fork_block).await.unwrap();
        assert!(range.is_empty());
        assert!(DifficultySeries::from_blocks(range, &blocks).points.is_empty());
    }
    blocks_requested.assert_async().await;
}

#[tokio::test]
async fn test_rewards_tallied_per_node() {
    let mut node_a = mockito::Server::new_async().await;
    let mut node_b = mockito::Server::new_async().await;
    let _ha = mock_head(&mut node_a, 2).await;
    let _hb = mock_head(&mut node_b, 3).await;

    let mut mocks = Vec::new();
    for n in 1..=2u64 {
        mocks.push(mock_block(&mut node_a, block_json(n, n * 10, "Pow", 0, None)).await);
    }
    for n in 2..=3u64 {
        mocks.push(mock_block(&mut node_b, block_json(n, n * 10, "Pos", 0, None)).await);
    }

    let collector = Collector::from_clients(vec![client(&node_a), client(&node_b)]);
    // Two-block trailing window against each node's own head
    let tallies = fetch_rewards_per_node(collector.clients(), |latest| {
        BlockRange::resolve(latest, None, None, 2, 1)
    })
    .await
    .unwrap();
    assert_eq!(tallies.len(), 2);

    let miner = Address::from_hex(
        "0xa00a2d0d10ce8a2ea47a76fbb935405df2a12b0e2bc932f188f84b5f16da9c2c",
    )
    .unwrap();
    assert_eq!((tallies[0].total_pow, tallies[0].total_pos), (2, 0));
    assert_eq!((tallies[1].total_pow, tallies[1].total_pos), (0, 2));
    assert_eq!(tallies[0].miners[&miner].seal_type, SealType::Pow);
    assert_eq!(tallies[1].miners[&miner].seal_type, SealType::Pos);
    assert_eq!(tallies[1].miner_share(&miner), Some(100.0));
    for mock in mocks {
        mock.assert_async().await;
    }
}
