//! # BaseApp
//!
//! Minimal ledger application: mounts module stores over one [`KvStore`],
//! then at `init_chain` checks the genesis, decodes and verifies every
//! gentx and writes each module's state into its store in one batch.

use genesis_builder::{invariants, GenesisCodec, GenesisDocument, GenesisError, GenesisTx};
use parking_lot::RwLock;
use serde::Serialize;
use shared_crypto::sha256;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::store::{BatchOperation, KvStore, PrefixStore, StoreKey};
use crate::errors::{BootstrapError, BootstrapResult};

/// Turns raw transaction bytes into a gentx.
pub type TxDecoder = Arc<dyn Fn(&[u8]) -> Result<GenesisTx, GenesisError> + Send + Sync>;

/// Decoder that checks type URLs against the codec's registry.
pub fn default_tx_decoder(codec: GenesisCodec) -> TxDecoder {
    Arc::new(move |bytes: &[u8]| codec.decode_tx(bytes))
}

/// Module stores every genesis needs.
pub const AUTH_STORE: &str = "acc";
pub const BANK_STORE: &str = "bank";
pub const STAKING_STORE: &str = "staking";
pub const GENUTIL_STORE: &str = "genutil";
pub const MODULE_STORES: [&str; 4] = [AUTH_STORE, BANK_STORE, STAKING_STORE, GENUTIL_STORE];

/// 32-byte hash committed by `init_chain`.
pub type AppHash = [u8; 32];

/// Key in the genutil store marking a store that already holds a genesis.
const APP_HASH_KEY: &[u8] = b"app_hash";

/// Ledger application as seen by a node.
pub trait Application: Send + Sync {
    fn name(&self) -> &str;

    fn chain_id(&self) -> &str;

    /// Load the genesis state. Called once per application.
    fn init_chain(&self, genesis: &GenesisDocument) -> BootstrapResult<AppHash>;

    fn last_block_height(&self) -> i64;

    /// Raw value from a mounted module store.
    fn query(&self, store: &str, key: &[u8]) -> BootstrapResult<Option<Vec<u8>>>;
}

#[derive(Debug, Default)]
struct ChainState {
    app_hash: Option<AppHash>,
    height: i64,
}

pub struct BaseApp {
    name: String,
    chain_id: String,
    db: Arc<dyn KvStore>,
    decoder: TxDecoder,
    codec: GenesisCodec,
    stores: BTreeMap<StoreKey, PrefixStore>,
    sealed: bool,
    state: RwLock<ChainState>,
}

impl BaseApp {
    pub fn new(
        name: impl Into<String>,
        db: Arc<dyn KvStore>,
        decoder: TxDecoder,
        codec: GenesisCodec,
        chain_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            chain_id: chain_id.into(),
            db,
            decoder,
            codec,
            stores: BTreeMap::new(),
            sealed: false,
            state: RwLock::new(ChainState::default()),
        }
    }

    /// Mount one prefix store per key. Fails after `load_latest_version`.
    pub fn mount_kv_stores<I, S>(&mut self, keys: I) -> BootstrapResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.sealed {
            return Err(BootstrapError::StoresSealed);
        }
        for name in keys {
            let key = StoreKey::new(name);
            if self.stores.contains_key(&key) {
                return Err(BootstrapError::DuplicateStore(key.name().to_string()));
            }
            let store = PrefixStore::new(self.db.clone(), &key);
            self.stores.insert(key, store);
        }
        Ok(())
    }

    /// Seal the store set. Every module store must be mounted by now.
    pub fn load_latest_version(&mut self) -> BootstrapResult<()> {
        for name in MODULE_STORES {
            self.store(name)?;
        }
        self.sealed = true;
        debug!(app = %self.name, stores = self.stores.len(), "Loaded latest version");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.sealed
    }

    pub fn app_hash(&self) -> Option<AppHash> {
        self.state.read().app_hash
    }

    fn store(&self, name: &str) -> BootstrapResult<&PrefixStore> {
        self.stores
            .get(&StoreKey::new(name))
            .ok_or_else(|| BootstrapError::StoreNotMounted(name.to_string()))
    }

    fn verify_gen_txs(&self, genesis: &GenesisDocument) -> BootstrapResult<()> {
        for (index, tx) in genesis.genutil.gen_txs.iter().enumerate() {
            let raw = self.codec.to_canonical_vec(tx)?;
            let decoded = (self.decoder)(&raw)?;
            decoded.verify(&self.codec, &self.chain_id)?;
            debug!(index, "Verified gentx");
        }
        Ok(())
    }

    fn encode<T: Serialize>(&self, value: &T) -> BootstrapResult<Vec<u8>> {
        Ok(self.codec.to_canonical_vec(value)?)
    }

    fn genesis_writes(&self, genesis: &GenesisDocument) -> BootstrapResult<Vec<BatchOperation>> {
        let mut ops = Vec::new();

        let auth = self.store(AUTH_STORE)?;
        ops.push(auth.put_op(b"params", self.encode(&genesis.auth.params)?));
        for account in genesis.auth.accounts.iter() {
            let key = format!("accounts/{}", account.address);
            ops.push(auth.put_op(key.as_bytes(), self.encode(account)?));
        }

        let bank = self.store(BANK_STORE)?;
        ops.push(bank.put_op(b"params", self.encode(&genesis.bank.params)?));
        ops.push(bank.put_op(b"supply", self.encode(&genesis.bank.supply)?));
        for balance in &genesis.bank.balances {
            let key = format!("balances/{}", balance.address);
            ops.push(bank.put_op(key.as_bytes(), self.encode(&balance.coins)?));
        }

        let staking = self.store(STAKING_STORE)?;
        ops.push(staking.put_op(b"params", self.encode(&genesis.staking.params)?));
        ops.push(staking.put_op(
            b"last_total_power",
            genesis.staking.last_total_power.to_string(),
        ));
        for validator in genesis.staking.validators.iter() {
            let key = format!("validators/{}", validator.operator_address);
            ops.push(staking.put_op(key.as_bytes(), self.encode(validator)?));
        }
        for delegation in &genesis.staking.delegations {
            let key = format!(
                "delegations/{}/{}",
                delegation.delegator_address, delegation.validator_address
            );
            ops.push(staking.put_op(key.as_bytes(), self.encode(&delegation.shares)?));
        }

        let genutil = self.store(GENUTIL_STORE)?;
        for (index, tx) in genesis.genutil.gen_txs.iter().enumerate() {
            let key = format!("gentx/{index:04}");
            ops.push(genutil.put_op(key.as_bytes(), self.encode(tx)?));
        }

        Ok(ops)
    }
}

impl Application for BaseApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn init_chain(&self, genesis: &GenesisDocument) -> BootstrapResult<AppHash> {
        if !self.sealed {
            return Err(BootstrapError::AppNotLoaded);
        }
        let mut state = self.state.write();
        if state.app_hash.is_some() || self.store(GENUTIL_STORE)?.exists(APP_HASH_KEY)? {
            return Err(BootstrapError::AlreadyInitialized(state.height));
        }
        if genesis.chain_id != self.chain_id {
            return Err(BootstrapError::ChainIdMismatch {
                app: self.chain_id.clone(),
                genesis: genesis.chain_id.clone(),
            });
        }

        invariants::check_all(genesis, &self.codec).map_err(GenesisError::from)?;
        self.verify_gen_txs(genesis)?;

        let app_hash = sha256(&self.encode(genesis)?);
        let mut ops = self.genesis_writes(genesis)?;
        ops.push(self.store(GENUTIL_STORE)?.put_op(APP_HASH_KEY, app_hash.to_vec()));
        let writes = ops.len();
        self.db.atomic_batch_write(ops)?;

        state.app_hash = Some(app_hash);

        info!(
            app = %self.name,
            chain_id = %self.chain_id,
            writes,
            app_hash = %hex::encode(app_hash),
            "Initialized chain from genesis"
        );
        Ok(app_hash)
    }

    fn last_block_height(&self) -> i64 {
        self.state.read().height
    }

    fn query(&self, store: &str, key: &[u8]) -> BootstrapResult<Option<Vec<u8>>> {
        self.store(store)?.get(key)
    }
}

impl fmt::Debug for BaseApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseApp")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("stores", &self.stores.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}
