//! # Node Runtime Library
//!
//! Bootstraps local validator networks from a genesis document. The
//! `testnet` binary in `main.rs` wires these modules together.
//!
//! ## Modules
//!
//! - `config`: node and testnet settings, CometBFT-style home layout
//! - `keys`: node key and private validator key files
//! - `disk`: prepares and locks a node home
//! - `genesis`: lazy genesis providers
//! - `app`: ledger application interface, `BaseApp` and the KV store
//! - `node`: `ConsensusNode` trait and the in-process `LocalNode`
//! - `testnet`: sequential multi-node bootstrap
//!
//! ## Startup Sequence
//!
//! ```text
//! for each validator key i:
//!     DiskConfig::new(node i)        create dirs, lock home, node key
//!     install_priv_validator(key i)
//!     write_genesis(bytes)           identical bytes in every home
//!     LocalNode::start()             genesis → init_chain → listeners
//!     peers += node i p2p_address
//! ```

#![allow(clippy::type_complexity)]

pub mod app;
pub mod config;
pub mod disk;
pub mod errors;
pub mod genesis;
pub mod keys;
pub mod node;
pub mod testnet;

pub use app::{Application, BaseApp, KvStore, MemDb};
pub use config::{NodeConfig, P2pConfig, PeerAddress, RpcConfig, TestnetConfig};
pub use disk::DiskConfig;
pub use errors::{BootstrapError, BootstrapResult};
pub use genesis::{file_genesis_provider, GenesisProvider};
pub use keys::{FilePrivValidator, NodeKey};
pub use node::{ConsensusNode, LocalNode, NodeStatus};
pub use testnet::{simapp_factory, NodeHandle, Testnet};
