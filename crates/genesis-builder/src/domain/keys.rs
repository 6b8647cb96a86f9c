//! Test key material.
//!
//! Validators sign with Ed25519 (the consensus key type); delegators hold
//! secp256k1 ledger keys. Both lists are ordered: the i-th delegator is
//! paired with the i-th validator when delegations are assembled.

use shared_crypto::{Ed25519KeyPair, Secp256k1KeyPair};

use super::GenesisResult;

/// Ordered Ed25519 validator keys.
#[derive(Debug, Clone)]
pub struct ValidatorPrivKeys(Vec<Ed25519KeyPair>);

impl ValidatorPrivKeys {
    /// Fresh random keys.
    pub fn generate(n: usize) -> Self {
        Self((0..n).map(|_| Ed25519KeyPair::generate()).collect())
    }

    /// Deterministic keys, one per seed.
    pub fn from_seeds(seeds: &[[u8; 32]]) -> Self {
        Self(seeds.iter().copied().map(Ed25519KeyPair::from_seed).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Ed25519KeyPair> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ed25519KeyPair> {
        self.0.iter()
    }
}

/// Ordered secp256k1 delegator keys.
#[derive(Debug)]
pub struct DelegatorPrivKeys(Vec<Secp256k1KeyPair>);

impl DelegatorPrivKeys {
    /// Fresh random keys.
    pub fn generate(n: usize) -> Self {
        Self((0..n).map(|_| Secp256k1KeyPair::generate()).collect())
    }

    /// Deterministic keys from 32-byte secrets.
    pub fn from_secrets(secrets: &[[u8; 32]]) -> GenesisResult<Self> {
        let keys = secrets
            .iter()
            .map(|secret| Secp256k1KeyPair::from_bytes(*secret))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(keys))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Secp256k1KeyPair> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Secp256k1KeyPair> {
        self.0.iter()
    }
}
