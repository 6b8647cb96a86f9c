//! Generate a genesis, boot a network from it and talk to every node.

use genesis_builder::{PowerProportionalShares, TestnetGenesisConfig, ValidatorDefaults};
use node_runtime::{NodeHandle, NodeStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use super::fixtures::{boot, seeded_genesis, testnet_config};

async fn status(node: &NodeHandle) -> NodeStatus {
    let stream = TcpStream::connect(node.rpc_address().unwrap()).await.unwrap();
    let line = BufReader::new(stream)
        .lines()
        .next_line()
        .await
        .unwrap()
        .unwrap();
    serde_json::from_str(&line).unwrap()
}

async fn wait_for_peer_count(node: &NodeHandle, n: usize) {
    for _ in 0..150 {
        if node.peers().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} has peers {:?}, expected {n}", node.moniker(), node.peers());
}

#[tokio::test]
async fn test_three_validator_network() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig {
        validators: 3,
        ..TestnetGenesisConfig::default()
    };
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    // Act
    let testnet = boot(&config, &generated, &generated.genesis).await.unwrap();

    // Assert
    assert_eq!(testnet.len(), 3);
    let last = testnet.node(2).unwrap();
    assert_eq!(last.config().p2p.persistent_peers.len(), 2);
    wait_for_peer_count(last, 2).await;

    for node in testnet.nodes() {
        let status = status(node).await;
        assert_eq!(status.chain_id, genesis_config.chain_id);
        assert_eq!(status.node_id, node.node_id());
        assert_eq!(status.moniker, node.moniker());
    }

    // every earlier node was dialed by the last one
    let last_status = status(last).await;
    for earlier in &testnet.nodes()[..2] {
        assert!(last_status.peers.contains(&earlier.node_id()));
    }

    testnet.shutdown().await;
}

#[tokio::test]
async fn test_power_proportional_shares_boot() {
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig {
        validators: 2,
        defaults: ValidatorDefaults {
            voting_power: 5,
            ..ValidatorDefaults::default()
        },
        share_policy: Arc::new(PowerProportionalShares),
        ..TestnetGenesisConfig::default()
    };
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    let testnet = boot(&config, &generated, &generated.genesis).await.unwrap();
    assert!(testnet.nodes().iter().all(|n| n.is_running()));
    testnet.shutdown().await;
}

#[tokio::test]
async fn test_single_validator_has_no_peers() {
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig {
        validators: 1,
        ..TestnetGenesisConfig::default()
    };
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    let testnet = boot(&config, &generated, &generated.genesis).await.unwrap();
    let node = testnet.node(0).unwrap();

    assert!(node.config().p2p.persistent_peers.is_empty());
    assert!(status(node).await.peers.is_empty());
    testnet.shutdown().await;
}
