//! Validator records.
//!
//! Each validator exists twice in a genesis document: once for the consensus
//! engine ([`GenesisValidator`]) and once for the staking module
//! ([`StakingValidator`]). Both are derived from the same Ed25519 key and
//! must agree on address and key.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::{envelope_from_consensus, module_address, ConsensusPubKey, PubKeyEnvelope};
use shared_types::{Address, AddressCodec, Amount, Coin, Coins, Dec};
use tracing::debug;

use super::account::Balance;
use super::keys::ValidatorPrivKeys;
use super::params::{CommissionRates, ValidatorDefaults};
use super::{GenesisError, GenesisResult};

/// Module account holding the tokens of bonded validators.
pub const BONDED_POOL_NAME: &str = "bonded_tokens_pool";

/// Module account holding tokens of unbonding and unbonded validators.
pub const NOT_BONDED_POOL_NAME: &str = "not_bonded_tokens_pool";

/// Commission update time recorded at genesis.
pub const GENESIS_TIME: &str = "1970-01-01T00:00:00Z";

// =============================================================================
// CONSENSUS VALIDATORS
// =============================================================================

/// Validator as seen by the consensus engine.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: Address,
    pub pub_key: ConsensusPubKey,
    #[serde_as(as = "DisplayFromStr")]
    pub power: i64,
    pub name: String,
}

/// Ordered consensus validator set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsensusValidators(Vec<GenesisValidator>);

impl ValidatorPrivKeys {
    /// One consensus validator per key, named `val-{i}`, all with the
    /// configured voting power.
    pub fn consensus_validators(&self, defaults: &ValidatorDefaults) -> GenesisResult<ConsensusValidators> {
        defaults.validate()?;

        let validators = self
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let pub_key = ConsensusPubKey::from(key.public_key());
                GenesisValidator {
                    address: Address::new(pub_key.address()),
                    pub_key,
                    power: defaults.voting_power,
                    name: format!("val-{i}"),
                }
            })
            .collect();

        Ok(ConsensusValidators(validators))
    }
}

impl ConsensusValidators {
    pub fn new(validators: Vec<GenesisValidator>) -> Self {
        Self(validators)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GenesisValidator> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenesisValidator> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[GenesisValidator] {
        &self.0
    }

    /// Total consensus power.
    pub fn total_power(&self) -> i64 {
        self.0.iter().map(|v| v.power).sum()
    }

    /// Staking-module records for every validator, plus the total token
    /// supply they bond.
    ///
    /// Each validator is bonded with `power * power_reduction` tokens and a
    /// single unit of delegator shares.
    pub fn staking_validators(
        &self,
        codec: &AddressCodec,
        defaults: &ValidatorDefaults,
    ) -> GenesisResult<(StakingValidators, Coins)> {
        defaults.validate()?;

        let mut validators = Vec::with_capacity(self.0.len());
        let mut supply = Coins::empty();

        for v in &self.0 {
            if v.power <= 0 {
                return Err(GenesisError::InvalidConfig(format!(
                    "validator {} has non-positive power {}",
                    v.name, v.power
                )));
            }

            let tokens = (v.power as Amount)
                .checked_mul(defaults.power_reduction)
                .ok_or_else(|| GenesisError::InvalidConfig(format!("tokens overflow for {}", v.name)))?;

            validators.push(StakingValidator {
                operator_address: codec.encode_validator(&v.address),
                consensus_pubkey: envelope_from_consensus(&v.pub_key)?,
                jailed: false,
                status: BondStatus::Bonded,
                tokens,
                delegator_shares: Dec::one(),
                description: Description::default(),
                unbonding_height: 0,
                unbonding_time: GENESIS_TIME.to_string(),
                commission: Commission {
                    commission_rates: defaults.commission,
                    update_time: GENESIS_TIME.to_string(),
                },
                min_self_delegation: 0,
            });

            supply = supply.checked_add_coin(&Coin::new(defaults.bond_denom.clone(), tokens)?)?;
        }

        debug!(
            validators = validators.len(),
            supply = %supply,
            "Assembled staking validators"
        );

        Ok((StakingValidators(validators), supply))
    }
}

impl From<Vec<GenesisValidator>> for ConsensusValidators {
    fn from(validators: Vec<GenesisValidator>) -> Self {
        Self(validators)
    }
}

// =============================================================================
// STAKING VALIDATORS
// =============================================================================

/// Bonding state of a staking validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondStatus {
    #[serde(rename = "BOND_STATUS_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BOND_STATUS_UNBONDED")]
    Unbonded,
    #[serde(rename = "BOND_STATUS_UNBONDING")]
    Unbonding,
    #[serde(rename = "BOND_STATUS_BONDED")]
    Bonded,
}

/// Human-facing validator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub security_contact: String,
    pub details: String,
}

impl Description {
    pub fn with_moniker(moniker: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub commission_rates: CommissionRates,
    pub update_time: String,
}

/// Validator as seen by the staking module.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingValidator {
    pub operator_address: String,
    pub consensus_pubkey: PubKeyEnvelope,
    pub jailed: bool,
    pub status: BondStatus,
    #[serde_as(as = "DisplayFromStr")]
    pub tokens: Amount,
    pub delegator_shares: Dec,
    pub description: Description,
    #[serde_as(as = "DisplayFromStr")]
    pub unbonding_height: i64,
    pub unbonding_time: String,
    pub commission: Commission,
    #[serde_as(as = "DisplayFromStr")]
    pub min_self_delegation: Amount,
}

impl StakingValidator {
    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }
}

/// Ordered staking validator set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StakingValidators(Vec<StakingValidator>);

impl StakingValidators {
    pub fn new(validators: Vec<StakingValidator>) -> Self {
        Self(validators)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StakingValidator> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[StakingValidator] {
        &self.0
    }

    /// Tokens held by bonded validators, in `denom`.
    pub fn bonded_tokens(&self, denom: &str) -> GenesisResult<Coins> {
        let total = self
            .0
            .iter()
            .filter(|v| v.is_bonded())
            .try_fold(0 as Amount, |acc, v| acc.checked_add(v.tokens))
            .ok_or_else(|| GenesisError::InvalidConfig("bonded tokens overflow".to_string()))?;
        Ok(Coins::from(Coin::new(denom, total)?))
    }

    /// Balance of the bonded pool module account that backs these validators.
    pub fn bonded_pool_balance(&self, codec: &AddressCodec, denom: &str) -> GenesisResult<Balance> {
        Ok(Balance {
            address: bonded_pool_address(codec),
            coins: self.bonded_tokens(denom)?,
        })
    }
}

impl From<Vec<StakingValidator>> for StakingValidators {
    fn from(validators: Vec<StakingValidator>) -> Self {
        Self(validators)
    }
}

/// Rendered address of the bonded pool.
pub fn bonded_pool_address(codec: &AddressCodec) -> String {
    codec.encode_account(&Address::new(module_address(BONDED_POOL_NAME)))
}

/// Rendered address of the not-bonded pool.
pub fn not_bonded_pool_address(codec: &AddressCodec) -> String {
    codec.encode_account(&Address::new(module_address(NOT_BONDED_POOL_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::DEFAULT_POWER_REDUCTION;

    fn validators(n: usize) -> ConsensusValidators {
        ValidatorPrivKeys::generate(n)
            .consensus_validators(&ValidatorDefaults::default())
            .unwrap()
    }

    #[test]
    fn test_consensus_validators_named_and_powered() {
        let vals = validators(3);

        assert_eq!(vals.len(), 3);
        for (i, v) in vals.iter().enumerate() {
            assert_eq!(v.name, format!("val-{i}"));
            assert_eq!(v.power, 1);
            assert_eq!(v.address.as_bytes(), &v.pub_key.address());
        }
        assert_eq!(vals.total_power(), 3);
    }

    #[test]
    fn test_staking_validators_mirror_consensus() {
        let codec = AddressCodec::default();
        let vals = validators(2);

        let (staking, supply) = vals
            .staking_validators(&codec, &ValidatorDefaults::default())
            .unwrap();

        assert_eq!(staking.len(), 2);
        for (cv, sv) in vals.iter().zip(staking.iter()) {
            assert_eq!(codec.decode_validator(&sv.operator_address).unwrap(), cv.address);
            assert_eq!(sv.status, BondStatus::Bonded);
            assert_eq!(sv.tokens, DEFAULT_POWER_REDUCTION);
            assert_eq!(sv.delegator_shares, Dec::one());
            assert_eq!(sv.min_self_delegation, 0);
            assert_eq!(sv.consensus_pubkey.key, cv.pub_key.as_bytes());
        }
        assert_eq!(supply.amount_of("stake"), 2 * DEFAULT_POWER_REDUCTION);
    }

    #[test]
    fn test_staking_tokens_scale_with_power() {
        let codec = AddressCodec::default();
        let defaults = ValidatorDefaults {
            voting_power: 5,
            ..ValidatorDefaults::default()
        };
        let vals = ValidatorPrivKeys::generate(1).consensus_validators(&defaults).unwrap();

        let (staking, _) = vals.staking_validators(&codec, &defaults).unwrap();
        assert_eq!(staking.as_slice()[0].tokens, 5 * DEFAULT_POWER_REDUCTION);
    }

    #[test]
    fn test_bonded_pool_balance() {
        let codec = AddressCodec::default();
        let (staking, supply) = validators(3)
            .staking_validators(&codec, &ValidatorDefaults::default())
            .unwrap();

        let pool = staking.bonded_pool_balance(&codec, "stake").unwrap();
        assert_eq!(pool.address, bonded_pool_address(&codec));
        assert_eq!(pool.coins, supply);
    }

    #[test]
    fn test_unbonded_validators_excluded_from_pool() {
        let codec = AddressCodec::default();
        let (staking, _) = validators(2)
            .staking_validators(&codec, &ValidatorDefaults::default())
            .unwrap();

        let mut list = staking.as_slice().to_vec();
        list[1].status = BondStatus::Unbonded;
        let staking = StakingValidators::new(list);

        let pool = staking.bonded_pool_balance(&codec, "stake").unwrap();
        assert_eq!(pool.coins.amount_of("stake"), DEFAULT_POWER_REDUCTION);
    }

    #[test]
    fn test_pool_addresses_differ() {
        let codec = AddressCodec::default();
        assert_ne!(bonded_pool_address(&codec), not_bonded_pool_address(&codec));
    }

    #[test]
    fn test_bls_consensus_key_rejected_for_staking() {
        let codec = AddressCodec::default();
        let key = shared_crypto::Bls12381PublicKey::from_bytes([9u8; 48]);
        let pub_key = ConsensusPubKey::Bls12381(key);
        let vals = ConsensusValidators::new(vec![GenesisValidator {
            address: Address::new(pub_key.address()),
            pub_key,
            power: 1,
            name: "val-0".to_string(),
        }]);

        let result = vals.staking_validators(&codec, &ValidatorDefaults::default());
        assert!(matches!(result, Err(GenesisError::Crypto(_))));
    }

    #[test]
    fn test_consensus_json_shape() {
        let vals = validators(1);
        let json = serde_json::to_value(&vals).unwrap();

        assert_eq!(json[0]["power"], "1");
        assert_eq!(json[0]["pub_key"]["type"], "consensus/PubKeyEd25519");
        assert_eq!(json[0]["name"], "val-0");
    }
}
