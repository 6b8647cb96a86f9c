//! Genesis providers.
//!
//! A node does not read its genesis when it is constructed; it calls the
//! provider at start. The file provider decodes the bytes and rejects any
//! document that breaks a genesis invariant.

use genesis_builder::{genesis_hash, invariants, GenesisCodec, GenesisDocument, GenesisError};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::errors::{BootstrapError, BootstrapResult};

/// Zero-argument source of the genesis document.
pub type GenesisProvider = Box<dyn Fn() -> BootstrapResult<GenesisDocument> + Send + Sync>;

/// Provider reading `path` each time it is called.
pub fn file_genesis_provider(path: impl Into<PathBuf>, codec: GenesisCodec) -> GenesisProvider {
    let path = path.into();
    Box::new(move || {
        let bytes = fs::read(&path).map_err(|source| BootstrapError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let doc: GenesisDocument = codec.decode(&bytes)?;
        invariants::check_all(&doc, &codec).map_err(GenesisError::from)?;

        info!(
            path = %path.display(),
            chain_id = %doc.chain_id,
            hash = %genesis_hash(&bytes),
            "Loaded genesis"
        );
        Ok(doc)
    })
}

/// Provider returning a fixed, already decoded document.
pub fn static_genesis_provider(doc: GenesisDocument) -> GenesisProvider {
    Box::new(move || Ok(doc.clone()))
}
