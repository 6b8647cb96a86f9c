//! Ledger accounts, balances and delegations.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::{LedgerPubKey, PubKeyEnvelope};
use shared_types::{Address, AddressCodec, Coins, Dec};
use std::fmt;

use super::keys::DelegatorPrivKeys;
use super::validator::{ConsensusValidators, GenesisValidator};
use super::{GenesisError, GenesisResult};

/// Ledger account with a known public key.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: String,
    pub pub_key: Option<PubKeyEnvelope>,
    #[serde_as(as = "DisplayFromStr")]
    pub account_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
}

/// Ordered ledger accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseAccounts(Vec<BaseAccount>);

impl DelegatorPrivKeys {
    /// One fresh account per key, account number and sequence zero.
    pub fn base_accounts(&self, codec: &AddressCodec) -> BaseAccounts {
        let accounts = self
            .iter()
            .map(|key| {
                let pub_key = LedgerPubKey::from(key.public_key());
                BaseAccount {
                    address: codec.encode_account(&Address::new(pub_key.address())),
                    pub_key: Some(pub_key.to_envelope()),
                    account_number: 0,
                    sequence: 0,
                }
            })
            .collect();
        BaseAccounts(accounts)
    }
}

impl BaseAccounts {
    pub fn new(accounts: Vec<BaseAccount>) -> Self {
        Self(accounts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaseAccount> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[BaseAccount] {
        &self.0
    }

    /// Give every account the same `single` balance.
    ///
    /// Returns the balances in account order and the total they add up to.
    pub fn balances(&self, single: &Coins) -> GenesisResult<(Vec<Balance>, Coins)> {
        let balances: Vec<Balance> = self
            .0
            .iter()
            .map(|acct| Balance {
                address: acct.address.clone(),
                coins: single.clone(),
            })
            .collect();

        let supply = Coins::sum(balances.iter().map(|b| &b.coins))?;
        Ok((balances, supply))
    }

    /// Pair the i-th account with the i-th validator.
    ///
    /// The two lists must have equal length; shares per pair come from
    /// `policy`.
    pub fn delegations(
        &self,
        validators: &ConsensusValidators,
        codec: &AddressCodec,
        policy: &dyn SharePolicy,
    ) -> GenesisResult<Vec<Delegation>> {
        if self.0.len() != validators.len() {
            return Err(GenesisError::CountMismatch {
                accounts: self.0.len(),
                validators: validators.len(),
            });
        }

        self.0
            .iter()
            .zip(validators.iter())
            .map(|(acct, val)| {
                Ok(Delegation {
                    delegator_address: acct.address.clone(),
                    validator_address: codec.encode_validator(&val.address),
                    shares: policy.shares(val)?,
                })
            })
            .collect()
    }
}

impl From<Vec<BaseAccount>> for BaseAccounts {
    fn from(accounts: Vec<BaseAccount>) -> Self {
        Self(accounts)
    }
}

/// Coins held by one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: String,
    pub coins: Coins,
}

/// Stake a delegator holds in a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
}

// =============================================================================
// SHARE POLICY
// =============================================================================

/// Decides how many shares each assembled delegation carries.
pub trait SharePolicy: fmt::Debug + Send + Sync {
    fn shares(&self, validator: &GenesisValidator) -> GenesisResult<Dec>;
}

/// The same share amount for every delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedShares(pub Dec);

impl Default for FixedShares {
    fn default() -> Self {
        Self(Dec::one())
    }
}

impl SharePolicy for FixedShares {
    fn shares(&self, _validator: &GenesisValidator) -> GenesisResult<Dec> {
        Ok(self.0)
    }
}

/// Shares equal to the validator's voting power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerProportionalShares;

impl SharePolicy for PowerProportionalShares {
    fn shares(&self, validator: &GenesisValidator) -> GenesisResult<Dec> {
        let power = u128::try_from(validator.power).map_err(|_| {
            GenesisError::InvalidConfig(format!(
                "validator {} has negative power {}",
                validator.name, validator.power
            ))
        })?;
        Ok(Dec::from_int(power)?)
    }
}
