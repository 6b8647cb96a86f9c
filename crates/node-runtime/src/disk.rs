//! # Node Home
//!
//! Prepares a node directory before the node starts: creates `config/` and
//! `data/`, takes an exclusive lock on `{root}/.lock`, loads or generates the
//! node key and initializes the private validator files.

use fs2::FileExt;
use shared_crypto::Ed25519KeyPair;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::errors::{BootstrapError, BootstrapResult};
use crate::keys::{FilePrivValidator, NodeKey};

/// Exclusive lock on a node home, released on drop.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    pub fn acquire(path: &Path) -> BootstrapResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| BootstrapError::WriteFile {
                path: path.to_path_buf(),
                source,
            })?;

        file.try_lock_exclusive()
            .map_err(|_| BootstrapError::HomeLocked {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "Failed to release home lock");
        }
    }
}

/// A prepared, locked node home.
#[derive(Debug)]
pub struct DiskConfig {
    config: NodeConfig,
    node_key: NodeKey,
    priv_validator: FilePrivValidator,
    lock: DirLock,
}

impl DiskConfig {
    pub fn new(config: NodeConfig) -> BootstrapResult<Self> {
        for dir in [config.config_dir(), config.data_dir()] {
            fs::create_dir_all(&dir).map_err(|source| BootstrapError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        let lock = DirLock::acquire(&config.lock_file())?;
        let node_key = NodeKey::load_or_generate(&config.node_key_file())?;
        let priv_validator = FilePrivValidator::load_or_generate(
            &config.priv_validator_key_file(),
            &config.priv_validator_state_file(),
        )?;

        info!(
            moniker = %config.moniker,
            home = %config.root_dir.display(),
            node_id = %node_key.id(),
            "Prepared node home"
        );

        Ok(Self {
            config,
            node_key,
            priv_validator,
            lock,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut NodeConfig {
        &mut self.config
    }

    pub fn node_key(&self) -> &NodeKey {
        &self.node_key
    }

    pub fn priv_validator(&self) -> &FilePrivValidator {
        &self.priv_validator
    }

    /// Replace the private validator with `key` and persist it.
    pub fn install_priv_validator(&mut self, key: Ed25519KeyPair) -> BootstrapResult<()> {
        let pv = FilePrivValidator::new(
            key,
            self.config.priv_validator_key_file(),
            self.config.priv_validator_state_file(),
        );
        pv.save()?;
        debug!(address = %pv.address(), "Installed priv validator key");
        self.priv_validator = pv;
        Ok(())
    }

    /// Write `config/genesis.json` verbatim.
    pub fn write_genesis(&self, bytes: &[u8]) -> BootstrapResult<PathBuf> {
        let path = self.config.genesis_file();
        fs::write(&path, bytes).map_err(|source| BootstrapError::WriteFile {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn into_parts(self) -> (NodeConfig, NodeKey, FilePrivValidator, DirLock) {
        (self.config, self.node_key, self.priv_validator, self.lock)
    }
}
