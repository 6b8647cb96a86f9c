//! Typed view of a genesis document.
//!
//! The builder writes fragments as raw JSON under these keys; reading the
//! finished bytes back through [`GenesisDocument`] is how invariants are
//! checked and how a node loads its initial state.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::sha256;
use shared_types::Coins;

use super::account::{Balance, BaseAccounts, Delegation};
use super::gentx::GenesisTx;
use super::params::{AuthParams, BankParams, ConsensusParams, SendEnabled, StakingParams};
use super::validator::{ConsensusValidators, StakingValidators};

/// Top-level document keys.
pub mod fragment {
    pub const CHAIN_ID: &str = "chain_id";
    pub const CONSENSUS: &str = "consensus";
    pub const AUTH: &str = "auth";
    pub const BANK: &str = "bank";
    pub const STAKING: &str = "staking";
    pub const GENUTIL: &str = "genutil";

    /// Fragments that must be present before a document can be encoded.
    pub const REQUIRED: [&str; 4] = [CONSENSUS, AUTH, BANK, STAKING];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusGenesis {
    pub params: ConsensusParams,
    pub validators: ConsensusValidators,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingGenesis {
    pub params: StakingParams,
    #[serde_as(as = "DisplayFromStr")]
    pub last_total_power: i64,
    pub validators: StakingValidators,
    pub delegations: Vec<Delegation>,
    pub exported: bool,
}

/// Display metadata for a denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomMetadata {
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    pub params: BankParams,
    pub balances: Vec<Balance>,
    pub supply: Coins,
    pub denom_metadata: Vec<DenomMetadata>,
    pub send_enabled: Vec<SendEnabled>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGenesis {
    pub params: AuthParams,
    pub accounts: BaseAccounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenutilGenesis {
    pub gen_txs: Vec<GenesisTx>,
}

/// A complete genesis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDocument {
    pub chain_id: String,
    pub consensus: ConsensusGenesis,
    pub auth: AuthGenesis,
    pub bank: BankGenesis,
    pub staking: StakingGenesis,
    #[serde(default)]
    pub genutil: GenutilGenesis,
}

/// SHA-256 of the encoded document, as shown to operators.
pub fn genesis_hash(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}
