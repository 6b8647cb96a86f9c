//! # Bootstrap Errors
//!
//! Every I/O failure names the step and the path it touched.

use genesis_builder::GenesisError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid key file {path}: {reason}")]
    KeyFile { path: PathBuf, reason: String },

    #[error("Node home {path} is locked by another process")]
    HomeLocked { path: PathBuf },

    #[error("Invalid listen address {0:?}")]
    InvalidAddress(String),

    #[error("Failed to bind {service} listener on {address}: {source}")]
    Bind {
        service: &'static str,
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Peer {address} rejected: {reason}")]
    Peer { address: String, reason: String },

    #[error("Genesis error: {0}")]
    Genesis(#[from] GenesisError),

    #[error("Store {0:?} is not mounted")]
    StoreNotMounted(String),

    #[error("Store {0:?} mounted twice")]
    DuplicateStore(String),

    #[error("Stores are sealed once the latest version is loaded")]
    StoresSealed,

    #[error("Application not loaded; call load_latest_version first")]
    AppNotLoaded,

    #[error("Chain already initialized at height {0}")]
    AlreadyInitialized(i64),

    #[error("Genesis is for chain {genesis:?} but the application runs {app:?}")]
    ChainIdMismatch { app: String, genesis: String },

    #[error("Node already started")]
    AlreadyStarted,

    #[error("Node {index} failed to start: {source}")]
    NodeStart {
        index: usize,
        #[source]
        source: Box<BootstrapError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
