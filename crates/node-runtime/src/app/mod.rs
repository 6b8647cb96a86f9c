//! Ledger application interface and its in-memory implementation.

pub mod base;
pub mod store;

pub use base::{
    default_tx_decoder, AppHash, Application, BaseApp, TxDecoder, AUTH_STORE, BANK_STORE,
    GENUTIL_STORE, MODULE_STORES, STAKING_STORE,
};
pub use store::{BatchOperation, KvStore, MemDb, PrefixStore, StoreKey};

use genesis_builder::GenesisCodec;
use std::sync::Arc;

/// A loaded `BaseApp` over a fresh `MemDb` with every module store mounted.
pub fn new_simapp(
    name: impl Into<String>,
    chain_id: impl Into<String>,
    codec: GenesisCodec,
) -> crate::errors::BootstrapResult<BaseApp> {
    let mut app = BaseApp::new(
        name,
        Arc::new(MemDb::new()),
        default_tx_decoder(codec.clone()),
        codec,
        chain_id,
    );
    app.mount_kv_stores(MODULE_STORES)?;
    app.load_latest_version()?;
    Ok(app)
}
