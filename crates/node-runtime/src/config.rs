//! # Node Configuration
//!
//! Per-node settings and the template a testnet stamps out for each node.
//! Files are laid out CometBFT style under the node home:
//!
//! ```text
//! {root}/config/genesis.json
//! {root}/config/node_key.json
//! {root}/config/priv_validator_key.json
//! {root}/data/priv_validator_state.json
//! ```

use genesis_builder::GenesisCodec;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{BootstrapError, BootstrapResult};

/// Listen on loopback with an OS-assigned port.
pub const EPHEMERAL_LISTEN_ADDRESS: &str = "tcp://127.0.0.1:0";

/// RPC configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub listen_address: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen_address: EPHEMERAL_LISTEN_ADDRESS.to_string(),
        }
    }
}

/// P2P configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2pConfig {
    pub listen_address: String,
    /// `{node_id}@{host}:{port}` entries dialed at startup.
    pub persistent_peers: Vec<String>,
    /// Accept more than one peer from the same IP (all local nodes share one).
    pub allow_duplicate_ip: bool,
    /// Refuse to dial non-routable addresses.
    pub addr_book_strict: bool,
    pub dial_timeout: Duration,
    pub dial_attempts: u32,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            listen_address: EPHEMERAL_LISTEN_ADDRESS.to_string(),
            persistent_peers: Vec::new(),
            allow_duplicate_ip: true,
            addr_book_strict: false,
            dial_timeout: Duration::from_secs(3),
            dial_attempts: 5,
        }
    }
}

/// Complete configuration of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Node home directory.
    pub root_dir: PathBuf,
    pub moniker: String,
    pub rpc: RpcConfig,
    pub p2p: P2pConfig,
}

impl NodeConfig {
    pub fn new(root_dir: impl Into<PathBuf>, moniker: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            moniker: moniker.into(),
            rpc: RpcConfig::default(),
            p2p: P2pConfig::default(),
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root_dir.join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root_dir.join("data")
    }

    pub fn genesis_file(&self) -> PathBuf {
        self.config_dir().join("genesis.json")
    }

    pub fn node_key_file(&self) -> PathBuf {
        self.config_dir().join("node_key.json")
    }

    pub fn priv_validator_key_file(&self) -> PathBuf {
        self.config_dir().join("priv_validator_key.json")
    }

    pub fn priv_validator_state_file(&self) -> PathBuf {
        self.data_dir().join("priv_validator_state.json")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root_dir.join(".lock")
    }
}

/// Settings shared by every node of a local testnet.
#[derive(Debug, Clone)]
pub struct TestnetConfig {
    /// Parent of the per-node homes `node0`, `node1`, ...
    pub root_dir: PathBuf,
    pub chain_id: String,
    pub address_prefix: String,
    pub moniker_prefix: String,
    pub rpc: RpcConfig,
    pub p2p: P2pConfig,
}

impl Default for TestnetConfig {
    fn default() -> Self {
        Self {
            root_dir: std::env::temp_dir().join("testnet"),
            chain_id: "simapp-chain".to_string(),
            address_prefix: "testnet".to_string(),
            moniker_prefix: "node".to_string(),
            rpc: RpcConfig::default(),
            p2p: P2pConfig::default(),
        }
    }
}

impl TestnetConfig {
    /// Configuration of node `index`, without peers.
    pub fn node_config(&self, index: usize) -> NodeConfig {
        NodeConfig {
            root_dir: self.root_dir.join(format!("{}{index}", self.moniker_prefix)),
            moniker: format!("{}{index}", self.moniker_prefix),
            rpc: self.rpc.clone(),
            p2p: P2pConfig {
                persistent_peers: Vec::new(),
                ..self.p2p.clone()
            },
        }
    }

    pub fn codec(&self) -> GenesisCodec {
        GenesisCodec::with_prefix(&self.address_prefix)
    }
}

/// Resolve `tcp://host:port` (or bare `host:port`) to a socket address.
pub fn parse_listen_address(address: &str) -> BootstrapResult<SocketAddr> {
    let bare = address.strip_prefix("tcp://").unwrap_or(address);
    bare.to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| BootstrapError::InvalidAddress(address.to_string()))
}

/// A parsed `{node_id}@{host}:{port}` peer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddress {
    pub node_id: String,
    pub address: SocketAddr,
}

impl PeerAddress {
    pub fn parse(entry: &str) -> BootstrapResult<Self> {
        let (node_id, host) = entry
            .split_once('@')
            .ok_or_else(|| BootstrapError::InvalidAddress(entry.to_string()))?;
        if node_id.is_empty() || !node_id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BootstrapError::InvalidAddress(entry.to_string()));
        }
        Ok(Self {
            node_id: node_id.to_string(),
            address: parse_listen_address(host)?,
        })
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.node_id, self.address)
    }
}
