//! # Key Files
//!
//! - `node_key.json`: the node's P2P identity. Its id is the lower-hex
//!   address of the public key.
//! - `priv_validator_key.json` + `priv_validator_state.json`: the consensus
//!   signing key and its last-signed height/round/step.
//!
//! Files holding secrets are written with owner-only permissions on Unix.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use shared_crypto::{ConsensusPubKey, Ed25519KeyPair, Ed25519PublicKey};
use shared_types::Address;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{BootstrapError, BootstrapResult};

const ED25519_KEY_TYPE: &str = "ed25519";

#[serde_as]
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct PrivKeyJson {
    #[serde(rename = "type")]
    key_type: String,
    #[serde_as(as = "Hex")]
    value: [u8; 32],
}

impl PrivKeyJson {
    fn ed25519(key: &Ed25519KeyPair) -> Self {
        Self {
            key_type: ED25519_KEY_TYPE.to_string(),
            value: *key.to_seed(),
        }
    }

    fn into_key(self, path: &Path) -> BootstrapResult<Ed25519KeyPair> {
        if self.key_type != ED25519_KEY_TYPE {
            return Err(BootstrapError::KeyFile {
                path: path.to_path_buf(),
                reason: format!("unsupported key type {:?}", self.key_type),
            });
        }
        Ok(Ed25519KeyPair::from_seed(self.value))
    }
}

// =============================================================================
// NODE KEY
// =============================================================================

#[derive(Serialize, Deserialize)]
struct NodeKeyFile {
    priv_key: PrivKeyJson,
}

/// P2P identity of a node.
#[derive(Debug, Clone)]
pub struct NodeKey {
    key: Ed25519KeyPair,
}

impl NodeKey {
    pub fn generate() -> Self {
        Self {
            key: Ed25519KeyPair::generate(),
        }
    }

    /// Reuse the key at `path`, or create and persist a new one.
    pub fn load_or_generate(path: &Path) -> BootstrapResult<Self> {
        if path.exists() {
            let key = Self::load(path)?;
            debug!(path = %path.display(), id = %key.id(), "Loaded node key");
            return Ok(key);
        }

        let key = Self::generate();
        key.save(path)?;
        info!(path = %path.display(), id = %key.id(), "Generated node key");
        Ok(key)
    }

    pub fn load(path: &Path) -> BootstrapResult<Self> {
        let file: NodeKeyFile = read_json(path)?;
        Ok(Self {
            key: file.priv_key.into_key(path)?,
        })
    }

    pub fn save(&self, path: &Path) -> BootstrapResult<()> {
        write_secret_json(
            path,
            &NodeKeyFile {
                priv_key: PrivKeyJson::ed25519(&self.key),
            },
        )
    }

    /// Node id: lower-hex address of the public key.
    pub fn id(&self) -> String {
        hex::encode(self.key.public_key().address())
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }
}

// =============================================================================
// PRIVATE VALIDATOR
// =============================================================================

#[derive(Serialize, Deserialize)]
struct PrivValidatorKeyFile {
    address: Address,
    pub_key: ConsensusPubKey,
    priv_key: PrivKeyJson,
}

/// Last signed position, guarding against double signing.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignState {
    #[serde_as(as = "DisplayFromStr")]
    pub height: i64,
    pub round: i32,
    pub step: i8,
}

/// Consensus signing key backed by two files.
#[derive(Debug, Clone)]
pub struct FilePrivValidator {
    key: Ed25519KeyPair,
    key_path: PathBuf,
    state_path: PathBuf,
    state: SignState,
}

impl FilePrivValidator {
    /// Fresh validator at height zero. Nothing is written until [`save`](Self::save).
    pub fn new(key: Ed25519KeyPair, key_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            key,
            key_path: key_path.into(),
            state_path: state_path.into(),
            state: SignState::default(),
        }
    }

    pub fn load(key_path: &Path, state_path: &Path) -> BootstrapResult<Self> {
        let file: PrivValidatorKeyFile = read_json(key_path)?;
        let key = file.priv_key.into_key(key_path)?;

        let pub_key = ConsensusPubKey::from(key.public_key());
        if file.pub_key != pub_key || file.address != Address::from(pub_key.address()) {
            return Err(BootstrapError::KeyFile {
                path: key_path.to_path_buf(),
                reason: "address or public key does not match the private key".to_string(),
            });
        }

        let state = if state_path.exists() {
            read_json(state_path)?
        } else {
            SignState::default()
        };

        Ok(Self {
            key,
            key_path: key_path.to_path_buf(),
            state_path: state_path.to_path_buf(),
            state,
        })
    }

    /// Load both files if the key file exists, otherwise generate and save.
    pub fn load_or_generate(key_path: &Path, state_path: &Path) -> BootstrapResult<Self> {
        if key_path.exists() {
            return Self::load(key_path, state_path);
        }
        let pv = Self::new(Ed25519KeyPair::generate(), key_path, state_path);
        pv.save()?;
        Ok(pv)
    }

    /// Write the key file and the sign-state file.
    pub fn save(&self) -> BootstrapResult<()> {
        let pub_key = self.pub_key();
        write_secret_json(
            &self.key_path,
            &PrivValidatorKeyFile {
                address: Address::from(pub_key.address()),
                pub_key,
                priv_key: PrivKeyJson::ed25519(&self.key),
            },
        )?;
        write_json(&self.state_path, &self.state)
    }

    pub fn address(&self) -> Address {
        Address::from(self.key.public_key().address())
    }

    pub fn pub_key(&self) -> ConsensusPubKey {
        ConsensusPubKey::from(self.key.public_key())
    }

    pub fn state(&self) -> SignState {
        self.state
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

// =============================================================================
// FILE HELPERS
// =============================================================================

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> BootstrapResult<T> {
    let bytes = fs::read(path).map_err(|source| BootstrapError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| BootstrapError::KeyFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn to_pretty_json<T: Serialize>(path: &Path, value: &T) -> BootstrapResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| BootstrapError::KeyFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> BootstrapResult<()> {
    let bytes = to_pretty_json(path, value)?;
    fs::write(path, bytes).map_err(|source| BootstrapError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

fn write_secret_json<T: Serialize>(path: &Path, value: &T) -> BootstrapResult<()> {
    let bytes = to_pretty_json(path, value)?;
    let write_err = |source| BootstrapError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(&bytes).map_err(write_err)
}
