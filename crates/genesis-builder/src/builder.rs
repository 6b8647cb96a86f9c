//! # Genesis Builder
//!
//! Accumulates the fragments of a genesis document and encodes them into
//! canonical bytes.
//!
//! ## Contract
//!
//! - `chain_id` is set exactly once and before any `gen_tx`.
//! - Each fragment setter may be called once; a second call is an error.
//! - A failed call leaves the builder unchanged.
//! - `encode` does not consume the builder and returns identical bytes for
//!   identical input. It refuses to encode a document whose fragments
//!   disagree with each other.

use serde::Serialize;
use serde_json::{Map, Value};
use shared_crypto::{Ed25519KeyPair, LedgerPubKey};
use shared_types::{Address, Coin, Coins};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::codec::GenesisCodec;
use crate::domain::{
    fragment, AuthGenesis, AuthParams, Balance, BankGenesis, BankParams, BaseAccounts,
    ConsensusGenesis, ConsensusParams, ConsensusValidators, Delegation, DenomMetadata,
    Description, GenesisDocument, GenesisError, GenesisResult, GenesisTx, GenesisValidator,
    GenutilGenesis, MsgCreateValidator, SendEnabled, StakingGenesis, StakingParams,
    StakingValidators, ValidatorDefaults,
};
use crate::invariants;

/// Incremental genesis document builder.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    codec: GenesisCodec,
    defaults: ValidatorDefaults,
    chain_id: Option<String>,
    fragments: BTreeMap<&'static str, Value>,
    gen_txs: Vec<GenesisTx>,
}

impl Default for GenesisBuilder {
    fn default() -> Self {
        Self::new(GenesisCodec::default())
    }
}

impl GenesisBuilder {
    pub fn new(codec: GenesisCodec) -> Self {
        Self {
            codec,
            defaults: ValidatorDefaults::default(),
            chain_id: None,
            fragments: BTreeMap::new(),
            gen_txs: Vec::new(),
        }
    }

    /// Override the commission, moniker and self-delegation used by `gen_tx`.
    pub fn with_validator_defaults(mut self, defaults: ValidatorDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn codec(&self) -> &GenesisCodec {
        &self.codec
    }

    pub fn chain_id(&mut self, id: &str) -> GenesisResult<&mut Self> {
        if let Some(existing) = &self.chain_id {
            return Err(GenesisError::ChainIdAlreadySet {
                existing: existing.clone(),
            });
        }
        if id.trim().is_empty() {
            return Err(GenesisError::EmptyChainId);
        }

        self.chain_id = Some(id.to_string());
        Ok(self)
    }

    /// Consensus params and validator set. `None` selects the default params.
    pub fn consensus(
        &mut self,
        params: Option<ConsensusParams>,
        validators: &ConsensusValidators,
    ) -> GenesisResult<&mut Self> {
        let params = params.unwrap_or_default();
        params.validate()?;

        self.set_fragment(
            fragment::CONSENSUS,
            &ConsensusGenesis {
                params,
                validators: validators.clone(),
            },
        )
    }

    pub fn staking(
        &mut self,
        params: StakingParams,
        validators: &StakingValidators,
        delegations: &[Delegation],
    ) -> GenesisResult<&mut Self> {
        shared_types::validate_denom(&params.bond_denom)?;
        self.defaults.validate()?;

        let last_total_power = validators
            .iter()
            .filter(|v| v.is_bonded())
            .map(|v| v.tokens / self.defaults.power_reduction)
            .sum::<u128>();
        let last_total_power = i64::try_from(last_total_power)
            .map_err(|_| GenesisError::InvalidConfig("total power overflows i64".to_string()))?;

        self.set_fragment(
            fragment::STAKING,
            &StakingGenesis {
                params,
                last_total_power,
                validators: validators.clone(),
                delegations: delegations.to_vec(),
                exported: false,
            },
        )
    }

    pub fn staking_with_default_params(
        &mut self,
        validators: &StakingValidators,
        delegations: &[Delegation],
    ) -> GenesisResult<&mut Self> {
        let params = StakingParams {
            bond_denom: self.defaults.bond_denom.clone(),
            ..StakingParams::default()
        };
        self.staking(params, validators, delegations)
    }

    pub fn banking(
        &mut self,
        params: BankParams,
        balances: &[Balance],
        total_supply: &Coins,
        denom_metadata: &[DenomMetadata],
        send_enabled: &[SendEnabled],
    ) -> GenesisResult<&mut Self> {
        self.set_fragment(
            fragment::BANK,
            &BankGenesis {
                params,
                balances: balances.to_vec(),
                supply: total_supply.clone(),
                denom_metadata: denom_metadata.to_vec(),
                send_enabled: send_enabled.to_vec(),
            },
        )
    }

    pub fn banking_with_default_params(
        &mut self,
        balances: &[Balance],
        total_supply: &Coins,
        denom_metadata: &[DenomMetadata],
        send_enabled: &[SendEnabled],
    ) -> GenesisResult<&mut Self> {
        self.banking(
            BankParams::default(),
            balances,
            total_supply,
            denom_metadata,
            send_enabled,
        )
    }

    pub fn auth(&mut self, params: AuthParams, accounts: &BaseAccounts) -> GenesisResult<&mut Self> {
        self.set_fragment(
            fragment::AUTH,
            &AuthGenesis {
                params,
                accounts: accounts.clone(),
            },
        )
    }

    pub fn auth_with_default_params(&mut self, accounts: &BaseAccounts) -> GenesisResult<&mut Self> {
        self.auth(AuthParams::default(), accounts)
    }

    /// Sign a self-registration for `validator` bonding `amount`, and append it.
    pub fn gen_tx(
        &mut self,
        key: &Ed25519KeyPair,
        validator: &GenesisValidator,
        amount: Coin,
    ) -> GenesisResult<&mut Self> {
        let chain_id = self.chain_id.as_deref().ok_or(GenesisError::ChainIdNotSet)?;

        let public_key = LedgerPubKey::from(key.public_key());
        if Address::new(public_key.address()) != validator.address {
            return Err(GenesisError::InvalidGenTx(format!(
                "key does not belong to validator {}",
                validator.name
            )));
        }

        let moniker = self
            .defaults
            .moniker
            .clone()
            .unwrap_or_else(|| validator.name.clone());
        let msg = MsgCreateValidator {
            description: Description::with_moniker(moniker),
            commission: self.defaults.commission,
            min_self_delegation: self.defaults.min_self_delegation,
            validator_address: self
                .codec
                .address_codec()
                .encode_validator(&validator.address),
            pubkey: public_key.to_envelope(),
            value: amount,
        };

        let tx = GenesisTx::sign(&self.codec, chain_id, key, msg)?;
        self.gen_txs.push(tx);
        Ok(self)
    }

    /// Assemble and validate the typed document.
    pub fn build(&self) -> GenesisResult<GenesisDocument> {
        let value = self.assemble()?;
        let doc: GenesisDocument = serde_json::from_value(value)?;
        invariants::check_all(&doc, &self.codec)?;
        Ok(doc)
    }

    /// Canonical bytes of the finished document.
    pub fn encode(&self) -> GenesisResult<Vec<u8>> {
        let doc = self.build()?;
        let bytes = self.codec.to_canonical_vec(&doc)?;

        info!(
            chain_id = %doc.chain_id,
            validators = doc.consensus.validators.len(),
            gen_txs = doc.genutil.gen_txs.len(),
            bytes = bytes.len(),
            "Encoded genesis document"
        );
        Ok(bytes)
    }

    fn assemble(&self) -> GenesisResult<Value> {
        let chain_id = self.chain_id.as_ref().ok_or(GenesisError::ChainIdNotSet)?;
        for key in fragment::REQUIRED {
            if !self.fragments.contains_key(key) {
                return Err(GenesisError::MissingFragment(key));
            }
        }

        let mut doc = Map::new();
        doc.insert(fragment::CHAIN_ID.to_string(), Value::String(chain_id.clone()));
        for (key, value) in &self.fragments {
            doc.insert(key.to_string(), value.clone());
        }
        doc.insert(
            fragment::GENUTIL.to_string(),
            serde_json::to_value(GenutilGenesis {
                gen_txs: self.gen_txs.clone(),
            })?,
        );
        Ok(Value::Object(doc))
    }

    fn set_fragment<T: Serialize>(&mut self, key: &'static str, value: &T) -> GenesisResult<&mut Self> {
        if self.fragments.contains_key(key) {
            return Err(GenesisError::DuplicateFragment(key));
        }
        let value = self.codec.to_canonical_value(value)?;
        self.fragments.insert(key, value);
        debug!(fragment = key, "Genesis fragment set");
        Ok(self)
    }
}
