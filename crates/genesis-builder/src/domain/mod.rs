//! Domain layer: genesis records and the rules for assembling them.

pub mod account;
pub mod errors;
pub mod gentx;
pub mod keys;
pub mod params;
pub mod state;
pub mod validator;

pub use account::{
    Balance, BaseAccount, BaseAccounts, Delegation, FixedShares, PowerProportionalShares,
    SharePolicy,
};
pub use errors::{GenesisError, GenesisResult, InvariantViolation};
pub use gentx::{
    sign_bytes, AuthInfo, Fee, GenesisTx, ModeInfo, MsgCreateValidator, SignMode, SignerData,
    SignerInfo, SingleMode, TxBody, TxMsg, MSG_CREATE_VALIDATOR_TYPE_URL,
};
pub use keys::{DelegatorPrivKeys, ValidatorPrivKeys};
pub use params::{
    AuthParams, BankParams, BlockParams, CommissionRates, ConsensusParams, EvidenceParams,
    SendEnabled, StakingParams, ValidatorDefaults, ValidatorParams, VersionParams,
    DEFAULT_BOND_DENOM, DEFAULT_POWER_REDUCTION,
};
pub use state::{
    fragment, genesis_hash, AuthGenesis, BankGenesis, ConsensusGenesis, DenomMetadata, DenomUnit,
    GenesisDocument, GenutilGenesis, StakingGenesis,
};
pub use validator::{
    bonded_pool_address, not_bonded_pool_address, BondStatus, Commission, ConsensusValidators,
    Description, GenesisValidator, StakingValidator, StakingValidators, BONDED_POOL_NAME,
    NOT_BONDED_POOL_NAME,
};
