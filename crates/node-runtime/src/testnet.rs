//! # Local Testnet
//!
//! Starts one node per validator key, strictly in order. Node `i` is given
//! the realized P2P addresses of nodes `0..i` as persistent peers, so no
//! address has to be known before a node has bound its listener.
//!
//! If any node fails to start, every node already running is stopped in
//! reverse order before the error is returned.

use genesis_builder::{GenesisCodec, ValidatorPrivKeys};
use shared_crypto::Ed25519KeyPair;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::app::{new_simapp, Application};
use crate::config::{NodeConfig, PeerAddress, TestnetConfig};
use crate::disk::{DirLock, DiskConfig};
use crate::errors::{BootstrapError, BootstrapResult};
use crate::genesis::file_genesis_provider;
use crate::node::{ConsensusNode, LocalNode};

/// Factory giving every node a fresh in-memory `BaseApp`.
pub fn simapp_factory(
    chain_id: impl Into<String>,
    codec: GenesisCodec,
) -> impl Fn(usize, &NodeConfig) -> BootstrapResult<Arc<dyn Application>> {
    let chain_id = chain_id.into();
    move |_, config: &NodeConfig| {
        let app = new_simapp(config.moniker.clone(), chain_id.clone(), codec.clone())?;
        Ok(Arc::new(app) as Arc<dyn Application>)
    }
}

/// A started node.
///
/// Dropping the handle drops the node, which signals its tasks and aborts
/// them, then releases the home lock.
pub struct NodeHandle {
    index: usize,
    config: NodeConfig,
    p2p: PeerAddress,
    node: Box<dyn ConsensusNode>,
    _lock: DirLock,
}

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn moniker(&self) -> &str {
        &self.config.moniker
    }

    /// Realized P2P address reported at start.
    pub fn p2p_address(&self) -> &PeerAddress {
        &self.p2p
    }

    pub fn rpc_address(&self) -> Option<SocketAddr> {
        self.node.rpc_address()
    }

    pub fn node_id(&self) -> String {
        self.node.node_id()
    }

    pub fn peers(&self) -> Vec<String> {
        self.node.peers()
    }

    pub fn is_running(&self) -> bool {
        self.node.is_running()
    }

    pub async fn stop(&mut self) -> BootstrapResult<()> {
        self.node.stop().await
    }
}

pub struct Testnet {
    nodes: Vec<NodeHandle>,
}

impl Testnet {
    /// Write `genesis` into every node home and start the nodes in order.
    pub async fn start<F>(
        config: &TestnetConfig,
        genesis: &[u8],
        validator_keys: &ValidatorPrivKeys,
        app_factory: F,
    ) -> BootstrapResult<Self>
    where
        F: Fn(usize, &NodeConfig) -> BootstrapResult<Arc<dyn Application>>,
    {
        if validator_keys.is_empty() {
            return Err(BootstrapError::InvalidConfig(
                "a testnet needs at least one validator".to_string(),
            ));
        }

        let codec = config.codec();
        let mut nodes: Vec<NodeHandle> = Vec::with_capacity(validator_keys.len());

        for (index, key) in validator_keys.iter().enumerate() {
            let peers: Vec<String> = nodes.iter().map(|n| n.p2p_address().to_string()).collect();
            match start_node(config, index, key, genesis, peers, &codec, &app_factory).await {
                Ok(handle) => {
                    info!(node = index, p2p = %handle.p2p_address(), "Testnet node up");
                    nodes.push(handle);
                }
                Err(source) => {
                    error!(node = index, error = %source, "Testnet node failed to start");
                    stop_all(&mut nodes).await;
                    return Err(BootstrapError::NodeStart {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        info!(nodes = nodes.len(), chain_id = %config.chain_id, "Testnet started");
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&NodeHandle> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stop every node, last started first.
    pub async fn shutdown(mut self) {
        stop_all(&mut self.nodes).await;
        info!("Testnet stopped");
    }
}

async fn start_node<F>(
    config: &TestnetConfig,
    index: usize,
    key: &Ed25519KeyPair,
    genesis: &[u8],
    peers: Vec<String>,
    codec: &GenesisCodec,
    app_factory: &F,
) -> BootstrapResult<NodeHandle>
where
    F: Fn(usize, &NodeConfig) -> BootstrapResult<Arc<dyn Application>>,
{
    let mut node_config = config.node_config(index);
    node_config.p2p.persistent_peers = peers;

    let mut disk = DiskConfig::new(node_config)?;
    disk.install_priv_validator(key.clone())?;
    let genesis_path = disk.write_genesis(genesis)?;
    let app = app_factory(index, disk.config())?;

    let (node_config, node_key, priv_validator, lock) = disk.into_parts();
    let provider = file_genesis_provider(genesis_path, codec.clone());
    let mut node = LocalNode::new(node_config.clone(), priv_validator, node_key, app, provider);
    node.start().await?;

    let p2p = node.p2p_address().ok_or_else(|| {
        BootstrapError::InvalidConfig("node started without a p2p address".to_string())
    })?;

    Ok(NodeHandle {
        index,
        config: node_config,
        p2p,
        node: Box::new(node),
        _lock: lock,
    })
}

async fn stop_all(nodes: &mut Vec<NodeHandle>) {
    while let Some(mut node) = nodes.pop() {
        if let Err(e) = node.stop().await {
            warn!(node = node.index(), error = %e, "Failed to stop node");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_builder::{TestnetGenesis, TestnetGenesisConfig};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_empty_key_set_rejected() {
        let dir = TempDir::new().unwrap();
        let config = TestnetConfig {
            root_dir: dir.path().to_path_buf(),
            ..TestnetConfig::default()
        };

        let result = Testnet::start(
            &config,
            b"{}",
            &ValidatorPrivKeys::generate(0),
            simapp_factory(&config.chain_id, config.codec()),
        )
        .await;

        assert!(matches!(result, Err(BootstrapError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_failure_reports_index_and_stops_started_nodes() {
        let dir = TempDir::new().unwrap();
        let config = TestnetConfig {
            root_dir: dir.path().to_path_buf(),
            ..TestnetConfig::default()
        };
        let testnet = TestnetGenesis::generate(&TestnetGenesisConfig::default()).unwrap();
        let simapp = simapp_factory(&config.chain_id, config.codec());

        let result = Testnet::start(
            &config,
            &testnet.genesis,
            &testnet.validator_keys,
            |index: usize, node: &NodeConfig| {
                if index == 1 {
                    return Err(BootstrapError::InvalidConfig("no app".to_string()));
                }
                simapp(index, node)
            },
        )
        .await;

        match result {
            Err(BootstrapError::NodeStart { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected NodeStart, got {:?}", other.map(|t| t.len())),
        }

        // node0 released its home lock when it was stopped
        assert!(DiskConfig::new(config.node_config(0)).is_ok());
    }

    #[tokio::test]
    async fn test_dropped_testnet_stops_nodes_and_releases_homes() {
        let dir = TempDir::new().unwrap();
        let config = TestnetConfig {
            root_dir: dir.path().to_path_buf(),
            ..TestnetConfig::default()
        };
        let generated = TestnetGenesis::generate(&TestnetGenesisConfig::default()).unwrap();

        let testnet = Testnet::start(
            &config,
            &generated.genesis,
            &generated.validator_keys,
            simapp_factory(&config.chain_id, config.codec()),
        )
        .await
        .unwrap();
        let rpc: Vec<SocketAddr> = testnet.nodes().iter().filter_map(|n| n.rpc_address()).collect();
        assert_eq!(rpc.len(), testnet.len());

        drop(testnet);

        for index in 0..rpc.len() {
            assert!(DiskConfig::new(config.node_config(index)).is_ok());
        }
        for addr in rpc {
            let mut closed = false;
            for _ in 0..50 {
                if TcpStream::connect(addr).await.is_err() {
                    closed = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            assert!(closed, "rpc listener {addr} still accepting after drop");
        }
    }
}
