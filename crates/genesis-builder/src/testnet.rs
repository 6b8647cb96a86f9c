//! One-call genesis for an n-validator test network.
//!
//! Generates keys, assembles every fragment, appends a signed gentx per
//! validator and encodes the result. The bonded pool balance is added to
//! the bank balances so the document's supply adds up.

use shared_types::{Amount, Coin, Coins};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::builder::GenesisBuilder;
use crate::codec::GenesisCodec;
use crate::domain::{
    genesis_hash, Balance, BaseAccounts, ConsensusParams, ConsensusValidators, Delegation,
    DelegatorPrivKeys, FixedShares, GenesisDocument, GenesisError, GenesisResult, SharePolicy,
    StakingValidators, ValidatorDefaults, ValidatorPrivKeys,
};

/// Balance each delegator account starts with.
pub const DEFAULT_DELEGATOR_BALANCE: Amount = 10_000_000_000_000;

#[derive(Clone)]
pub struct TestnetGenesisConfig {
    pub chain_id: String,
    pub validators: usize,
    pub delegator_balance: Amount,
    pub address_prefix: String,
    pub defaults: ValidatorDefaults,
    /// `None` selects the default consensus params.
    pub consensus_params: Option<ConsensusParams>,
    pub share_policy: Arc<dyn SharePolicy>,
}

impl Default for TestnetGenesisConfig {
    fn default() -> Self {
        Self {
            chain_id: "simapp-chain".to_string(),
            validators: 2,
            delegator_balance: DEFAULT_DELEGATOR_BALANCE,
            address_prefix: "testnet".to_string(),
            defaults: ValidatorDefaults::default(),
            consensus_params: None,
            share_policy: Arc::new(FixedShares::default()),
        }
    }
}

impl fmt::Debug for TestnetGenesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestnetGenesisConfig")
            .field("chain_id", &self.chain_id)
            .field("validators", &self.validators)
            .field("delegator_balance", &self.delegator_balance)
            .field("address_prefix", &self.address_prefix)
            .field("share_policy", &self.share_policy)
            .finish_non_exhaustive()
    }
}

impl TestnetGenesisConfig {
    pub fn codec(&self) -> GenesisCodec {
        GenesisCodec::with_prefix(&self.address_prefix)
    }

    pub fn validate(&self) -> GenesisResult<()> {
        if self.validators == 0 {
            return Err(GenesisError::InvalidConfig(
                "at least one validator is required".to_string(),
            ));
        }
        if self.chain_id.trim().is_empty() {
            return Err(GenesisError::EmptyChainId);
        }
        if self.address_prefix.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "address prefix must not be empty".to_string(),
            ));
        }
        self.defaults.validate()
    }
}

/// Everything produced while generating a test genesis.
#[derive(Debug)]
pub struct TestnetGenesis {
    pub validator_keys: ValidatorPrivKeys,
    pub delegator_keys: DelegatorPrivKeys,
    pub consensus_validators: ConsensusValidators,
    pub staking_validators: StakingValidators,
    pub accounts: BaseAccounts,
    pub balances: Vec<Balance>,
    pub delegations: Vec<Delegation>,
    pub total_supply: Coins,
    /// Canonical document bytes.
    pub genesis: Vec<u8>,
}

impl TestnetGenesis {
    /// Fresh random keys, one validator and one delegator per slot.
    pub fn generate(config: &TestnetGenesisConfig) -> GenesisResult<Self> {
        Self::from_keys(
            config,
            ValidatorPrivKeys::generate(config.validators),
            DelegatorPrivKeys::generate(config.validators),
        )
    }

    /// Build from caller-supplied keys.
    pub fn from_keys(
        config: &TestnetGenesisConfig,
        validator_keys: ValidatorPrivKeys,
        delegator_keys: DelegatorPrivKeys,
    ) -> GenesisResult<Self> {
        config.validate()?;
        if validator_keys.len() != config.validators {
            return Err(GenesisError::InvalidConfig(format!(
                "{} validator keys for {} validators",
                validator_keys.len(),
                config.validators
            )));
        }

        let codec = config.codec();
        let addresses = codec.address_codec();
        let defaults = &config.defaults;
        let denom = defaults.bond_denom.as_str();

        let consensus_validators = validator_keys.consensus_validators(defaults)?;
        let (staking_validators, bonded_supply) =
            consensus_validators.staking_validators(addresses, defaults)?;

        let accounts = delegator_keys.base_accounts(addresses);
        let single = Coins::from(Coin::new(denom, config.delegator_balance)?);
        let (mut balances, account_supply) = accounts.balances(&single)?;
        let delegations = accounts.delegations(
            &consensus_validators,
            addresses,
            config.share_policy.as_ref(),
        )?;

        balances.push(staking_validators.bonded_pool_balance(addresses, denom)?);
        let total_supply = account_supply.checked_add(&bonded_supply)?;

        let mut builder = GenesisBuilder::new(codec.clone()).with_validator_defaults(defaults.clone());
        builder
            .chain_id(&config.chain_id)?
            .consensus(config.consensus_params.clone(), &consensus_validators)?
            .staking_with_default_params(&staking_validators, &delegations)?
            .banking_with_default_params(&balances, &total_supply, &[], &[])?
            .auth_with_default_params(&accounts)?;

        let self_bond = defaults.bonded_tokens()?;
        for (key, validator) in validator_keys.iter().zip(consensus_validators.iter()) {
            builder.gen_tx(key, validator, Coin::new(denom, self_bond)?)?;
        }

        let genesis = builder.encode()?;

        info!(
            chain_id = %config.chain_id,
            validators = config.validators,
            supply = %total_supply,
            hash = %genesis_hash(&genesis),
            "Generated testnet genesis"
        );

        Ok(Self {
            validator_keys,
            delegator_keys,
            consensus_validators,
            staking_validators,
            accounts,
            balances,
            delegations,
            total_supply,
            genesis,
        })
    }

    /// Decode the generated bytes back into a typed document.
    pub fn document(&self, codec: &GenesisCodec) -> GenesisResult<GenesisDocument> {
        codec.decode(&self.genesis)
    }

    pub fn hash(&self) -> String {
        genesis_hash(&self.genesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_POWER_REDUCTION;

    #[test]
    fn test_default_two_validator_network() {
        let config = TestnetGenesisConfig::default();
        let testnet = TestnetGenesis::generate(&config).unwrap();

        assert_eq!(testnet.consensus_validators.len(), 2);
        assert_eq!(testnet.accounts.len(), 2);
        assert_eq!(testnet.delegations.len(), 2);
        // two delegators plus the bonded pool
        assert_eq!(testnet.balances.len(), 3);
        assert_eq!(
            testnet.total_supply.amount_of("stake"),
            2 * DEFAULT_DELEGATOR_BALANCE + 2 * DEFAULT_POWER_REDUCTION
        );
    }

    #[test]
    fn test_zero_validators_rejected() {
        let config = TestnetGenesisConfig {
            validators: 0,
            ..TestnetGenesisConfig::default()
        };
        assert!(matches!(
            TestnetGenesis::generate(&config),
            Err(GenesisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_key_count_must_match() {
        let config = TestnetGenesisConfig::default();
        let result = TestnetGenesis::from_keys(
            &config,
            ValidatorPrivKeys::generate(3),
            DelegatorPrivKeys::generate(3),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delegator_count_mismatch_surfaces() {
        let config = TestnetGenesisConfig::default();
        let result = TestnetGenesis::from_keys(
            &config,
            ValidatorPrivKeys::generate(2),
            DelegatorPrivKeys::generate(1),
        );
        assert!(matches!(result, Err(GenesisError::CountMismatch { .. })));
    }

    #[test]
    fn test_document_round_trip_keeps_chain_id() {
        let config = TestnetGenesisConfig {
            chain_id: "roundtrip-1".to_string(),
            ..TestnetGenesisConfig::default()
        };
        let testnet = TestnetGenesis::generate(&config).unwrap();
        let doc = testnet.document(&config.codec()).unwrap();

        assert_eq!(doc.chain_id, "roundtrip-1");
        assert_eq!(doc.genutil.gen_txs.len(), 2);
        assert_eq!(testnet.hash().len(), 64);
    }
}
