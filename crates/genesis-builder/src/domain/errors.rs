//! Error types for genesis construction

use shared_crypto::CryptoError;
use shared_types::{Coins, TypeError};
use thiserror::Error;

/// Genesis construction errors.
///
/// Contract violations (`ChainIdNotSet`, `ChainIdAlreadySet`,
/// `DuplicateFragment`, `CountMismatch`) are returned at the call that
/// broke the contract; nothing is partially applied.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("gen_tx called before chain_id: the chain id is part of every signing payload")]
    ChainIdNotSet,

    #[error("Chain id already set to {existing:?}")]
    ChainIdAlreadySet { existing: String },

    #[error("Chain id must not be empty")]
    EmptyChainId,

    #[error("Genesis fragment {0:?} set twice")]
    DuplicateFragment(&'static str),

    #[error("Genesis fragment {0:?} missing")]
    MissingFragment(&'static str),

    #[error("Number of accounts ({accounts}) != number of validators ({validators})")]
    CountMismatch { accounts: usize, validators: usize },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sign mode {0} cannot produce sign bytes")]
    UnsupportedSignMode(&'static str),

    #[error("Type URL {0:?} is not registered")]
    UnregisteredType(String),

    #[error("Invalid genesis transaction: {0}")]
    InvalidGenTx(String),

    #[error("Genesis transaction signature does not verify")]
    SignatureInvalid,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Type error: {0}")]
    Types(#[from] TypeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Cross-fragment consistency failures found in a finished document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Total supply {declared} != sum of balances {computed}")]
    SupplyMismatch { declared: Coins, computed: Coins },

    #[error("Bonded pool holds {pool} but bonded validators hold {bonded}")]
    BondedPoolMismatch { pool: Coins, bonded: Coins },

    #[error("Consensus lists {consensus} validators, staking lists {staking}")]
    ValidatorCountMismatch { consensus: usize, staking: usize },

    #[error("Staking validator {operator} has no matching consensus validator")]
    UnknownConsensusValidator { operator: String },

    #[error("Staking validator {operator} key differs from its consensus key")]
    ValidatorKeyMismatch { operator: String },

    #[error("Validator {0} appears more than once")]
    DuplicateValidator(String),

    #[error("Consensus validator {address} has non-positive power {power}")]
    NonPositivePower { address: String, power: i64 },

    #[error("Consensus validator {address} uses key type {key_type} not allowed by params")]
    DisallowedKeyType { address: String, key_type: String },

    #[error("Delegation from {delegator} references unknown validator {validator}")]
    UnknownDelegationValidator { delegator: String, validator: String },

    #[error("Balance held by unknown address {0}")]
    UnknownBalanceAddress(String),

    #[error("Malformed address {address}: {reason}")]
    MalformedAddress { address: String, reason: String },

    #[error("Genesis transaction #{index} rejected: {reason}")]
    GenTxRejected { index: usize, reason: String },

    #[error("Cannot total {what}: {reason}")]
    UncountableAmount { what: &'static str, reason: String },
}

/// Result type for genesis operations
pub type GenesisResult<T> = Result<T, GenesisError>;
