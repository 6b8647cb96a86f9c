//! Module parameters and the configurable test-fixture defaults.
//!
//! Every default in here can be overridden: the builder and the assemblers
//! take these structs by value or reference instead of baking numbers in.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{Amount, Dec};

use super::{GenesisError, GenesisResult};

/// Default bond denomination.
pub const DEFAULT_BOND_DENOM: &str = "stake";

/// Tokens per unit of consensus voting power.
pub const DEFAULT_POWER_REDUCTION: Amount = 1_000_000;

// =============================================================================
// CONSENSUS PARAMETERS
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    #[serde_as(as = "DisplayFromStr")]
    pub max_bytes: i64,
    /// -1 means unlimited.
    #[serde_as(as = "DisplayFromStr")]
    pub max_gas: i64,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    #[serde_as(as = "DisplayFromStr")]
    pub max_age_num_blocks: i64,
    /// Duration in nanoseconds.
    #[serde_as(as = "DisplayFromStr")]
    pub max_age_duration: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub max_bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    pub pub_key_types: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionParams {
    #[serde_as(as = "DisplayFromStr")]
    pub app: u64,
}

/// Consensus engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: BlockParams,
    pub evidence: EvidenceParams,
    pub validator: ValidatorParams,
    pub version: VersionParams,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            block: BlockParams {
                max_bytes: 22_020_096, // 21MB
                max_gas: -1,
            },
            evidence: EvidenceParams {
                max_age_num_blocks: 100_000,
                max_age_duration: 48 * 60 * 60 * 1_000_000_000, // 48h
                max_bytes: 1_048_576,
            },
            validator: ValidatorParams {
                pub_key_types: vec!["ed25519".to_string()],
            },
            version: VersionParams { app: 0 },
        }
    }
}

impl ConsensusParams {
    /// Basic sanity checks.
    pub fn validate(&self) -> GenesisResult<()> {
        if self.block.max_bytes <= 0 {
            return Err(GenesisError::InvalidConfig(format!(
                "block.max_bytes must be positive, got {}",
                self.block.max_bytes
            )));
        }
        if self.block.max_gas < -1 {
            return Err(GenesisError::InvalidConfig(format!(
                "block.max_gas must be -1 or more, got {}",
                self.block.max_gas
            )));
        }
        if self.evidence.max_age_num_blocks <= 0 || self.evidence.max_age_duration <= 0 {
            return Err(GenesisError::InvalidConfig(
                "evidence max age must be positive".to_string(),
            ));
        }
        if self.evidence.max_bytes > self.block.max_bytes {
            return Err(GenesisError::InvalidConfig(
                "evidence.max_bytes exceeds block.max_bytes".to_string(),
            ));
        }
        if self.validator.pub_key_types.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "validator.pub_key_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// MODULE PARAMETERS
// =============================================================================

/// Staking module parameters.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    pub unbonding_time: String,
    pub max_validators: u32,
    pub max_entries: u32,
    pub historical_entries: u32,
    pub bond_denom: String,
    pub min_commission_rate: Dec,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            unbonding_time: "1814400s".to_string(), // 3 weeks
            max_validators: 100,
            max_entries: 7,
            historical_entries: 10_000,
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            min_commission_rate: Dec::zero(),
        }
    }
}

/// Per-denomination send switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEnabled {
    pub denom: String,
    pub enabled: bool,
}

/// Bank module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankParams {
    pub send_enabled: Vec<SendEnabled>,
    pub default_send_enabled: bool,
}

impl Default for BankParams {
    fn default() -> Self {
        Self {
            send_enabled: Vec::new(),
            default_send_enabled: true,
        }
    }
}

/// Auth module parameters.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    #[serde_as(as = "DisplayFromStr")]
    pub max_memo_characters: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub tx_sig_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub tx_size_cost_per_byte: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub sig_verify_cost_ed25519: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_ed25519: 590,
            sig_verify_cost_secp256k1: 1000,
        }
    }
}

// =============================================================================
// TEST-FIXTURE DEFAULTS
// =============================================================================

/// Commission terms a validator registers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: Dec,
    pub max_rate: Dec,
    pub max_change_rate: Dec,
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            rate: Dec::percent(10),
            max_rate: Dec::percent(20),
            max_change_rate: Dec::percent(1),
        }
    }
}

impl CommissionRates {
    /// `0 <= rate <= max_rate <= 1` and `max_change_rate <= max_rate`.
    pub fn validate(&self) -> GenesisResult<()> {
        if self.max_rate > Dec::one() {
            return Err(GenesisError::InvalidMessage(format!(
                "commission max rate {} exceeds 1",
                self.max_rate
            )));
        }
        if self.rate > self.max_rate {
            return Err(GenesisError::InvalidMessage(format!(
                "commission rate {} exceeds max rate {}",
                self.rate, self.max_rate
            )));
        }
        if self.max_change_rate > self.max_rate {
            return Err(GenesisError::InvalidMessage(format!(
                "commission max change rate {} exceeds max rate {}",
                self.max_change_rate, self.max_rate
            )));
        }
        Ok(())
    }
}

/// Values the assemblers and the gentx signer fill in for every validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorDefaults {
    /// Consensus voting power of each validator.
    pub voting_power: i64,
    /// Tokens per unit of voting power.
    pub power_reduction: Amount,
    pub bond_denom: String,
    pub commission: CommissionRates,
    /// Minimum self delegation declared in each gentx.
    pub min_self_delegation: Amount,
    /// Moniker for gentx descriptions; the validator name is used when unset.
    pub moniker: Option<String>,
}

impl Default for ValidatorDefaults {
    fn default() -> Self {
        Self {
            voting_power: 1,
            power_reduction: DEFAULT_POWER_REDUCTION,
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            commission: CommissionRates::default(),
            min_self_delegation: 1,
            moniker: None,
        }
    }
}

impl ValidatorDefaults {
    pub fn validate(&self) -> GenesisResult<()> {
        if self.voting_power <= 0 {
            return Err(GenesisError::InvalidConfig(format!(
                "voting power must be positive, got {}",
                self.voting_power
            )));
        }
        if self.power_reduction == 0 {
            return Err(GenesisError::InvalidConfig(
                "power reduction must be positive".to_string(),
            ));
        }
        shared_types::validate_denom(&self.bond_denom)?;
        self.commission.validate()
    }

    /// Bonded tokens backing one validator.
    pub fn bonded_tokens(&self) -> GenesisResult<Amount> {
        (self.voting_power as Amount)
            .checked_mul(self.power_reduction)
            .ok_or_else(|| GenesisError::InvalidConfig("bonded tokens overflow".to_string()))
    }
}
