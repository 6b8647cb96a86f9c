//! Key-value storage behind the ledger application.
//!
//! One backing store is shared by every module; each module sees it through
//! a [`PrefixStore`] keyed by its [`StoreKey`]. Genesis state is written
//! once, as a single batch.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::BootstrapResult;

/// Abstract key-value store.
///
/// Methods take `&self`; implementations synchronize internally so one store
/// can be shared across the app and the node's tasks.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> BootstrapResult<Option<Vec<u8>>>;

    /// Apply every write, or none of them.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> BootstrapResult<()>;

    fn exists(&self, key: &[u8]) -> BootstrapResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Single put inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// In-memory store. The whole batch is applied under one write lock.
#[derive(Default)]
pub struct MemDb {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl fmt::Debug for MemDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemDb").field("entries", &self.len()).finish()
    }
}

impl KvStore for MemDb {
    fn get(&self, key: &[u8]) -> BootstrapResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> BootstrapResult<()> {
        let mut data = self.data.write();
        data.extend(operations.into_iter().map(|op| (op.key, op.value)));
        Ok(())
    }
}

/// Name of a module store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Key prefix `s/k:{name}/` inside the shared store.
    pub fn prefix(&self) -> Vec<u8> {
        format!("s/k:{}/", self.0).into_bytes()
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// View of a shared store restricted to one module's prefix.
#[derive(Clone)]
pub struct PrefixStore {
    inner: Arc<dyn KvStore>,
    prefix: Vec<u8>,
}

impl PrefixStore {
    pub fn new(inner: Arc<dyn KvStore>, key: &StoreKey) -> Self {
        Self {
            inner,
            prefix: key.prefix(),
        }
    }

    /// Full key in the shared store.
    pub fn key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }

    pub fn get(&self, key: &[u8]) -> BootstrapResult<Option<Vec<u8>>> {
        self.inner.get(&self.key(key))
    }

    pub fn exists(&self, key: &[u8]) -> BootstrapResult<bool> {
        self.inner.exists(&self.key(key))
    }

    pub fn put_op(&self, key: &[u8], value: impl Into<Vec<u8>>) -> BatchOperation {
        BatchOperation::put(self.key(key), value)
    }
}

impl fmt::Debug for PrefixStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixStore")
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .finish()
    }
}
