//! Cross-fragment consistency checks.
//!
//! Pure functions over a finished [`GenesisDocument`]. The builder runs
//! [`check_all`] before it hands out bytes; a node runs it again when it
//! loads a genesis file it did not build.

use shared_crypto::{envelope_from_consensus, module_address};
use shared_types::{Address, Coins};
use std::collections::{BTreeSet, HashSet};

use crate::codec::GenesisCodec;
use crate::domain::{
    GenesisDocument, GenesisTx, InvariantViolation, BONDED_POOL_NAME, NOT_BONDED_POOL_NAME,
};

type InvariantResult = Result<(), InvariantViolation>;

/// Run every check, stopping at the first violation.
pub fn check_all(doc: &GenesisDocument, codec: &GenesisCodec) -> InvariantResult {
    check_supply(doc)?;
    check_consensus_validators(doc)?;
    check_validator_identities(doc, codec)?;
    check_bonded_pool(doc, codec)?;
    check_delegations(doc)?;
    check_balance_addresses(doc, codec)?;
    check_gen_txs(doc, codec)?;
    Ok(())
}

/// Declared supply equals the sum of all balances.
pub fn check_supply(doc: &GenesisDocument) -> InvariantResult {
    let computed = Coins::sum(doc.bank.balances.iter().map(|b| &b.coins)).map_err(|e| {
        InvariantViolation::UncountableAmount {
            what: "balances",
            reason: e.to_string(),
        }
    })?;

    if computed != doc.bank.supply {
        return Err(InvariantViolation::SupplyMismatch {
            declared: doc.bank.supply.clone(),
            computed,
        });
    }
    Ok(())
}

/// Consensus validators are unique, powered and use allowed key types.
pub fn check_consensus_validators(doc: &GenesisDocument) -> InvariantResult {
    let allowed = &doc.consensus.params.validator.pub_key_types;
    let mut seen = HashSet::new();

    for v in doc.consensus.validators.iter() {
        if !seen.insert(v.address) {
            return Err(InvariantViolation::DuplicateValidator(v.address.to_string()));
        }
        if v.power <= 0 {
            return Err(InvariantViolation::NonPositivePower {
                address: v.address.to_string(),
                power: v.power,
            });
        }
        if !allowed.iter().any(|t| t == v.pub_key.algorithm()) {
            return Err(InvariantViolation::DisallowedKeyType {
                address: v.address.to_string(),
                key_type: v.pub_key.algorithm().to_string(),
            });
        }
        if v.address.as_bytes() != &v.pub_key.address() {
            return Err(InvariantViolation::MalformedAddress {
                address: v.address.to_string(),
                reason: "does not match its public key".to_string(),
            });
        }
    }
    Ok(())
}

/// Every staking validator has exactly one consensus twin with the same key.
pub fn check_validator_identities(doc: &GenesisDocument, codec: &GenesisCodec) -> InvariantResult {
    let consensus = &doc.consensus.validators;
    let staking = &doc.staking.validators;

    if consensus.len() != staking.len() {
        return Err(InvariantViolation::ValidatorCountMismatch {
            consensus: consensus.len(),
            staking: staking.len(),
        });
    }

    let mut seen = BTreeSet::new();
    for sv in staking.iter() {
        let operator = sv.operator_address.clone();
        let address = decode_validator(codec, &operator)?;
        if !seen.insert(address) {
            return Err(InvariantViolation::DuplicateValidator(operator));
        }

        let cv = consensus
            .iter()
            .find(|cv| cv.address == address)
            .ok_or_else(|| InvariantViolation::UnknownConsensusValidator {
                operator: operator.clone(),
            })?;

        let expected = envelope_from_consensus(&cv.pub_key)
            .map_err(|_| InvariantViolation::ValidatorKeyMismatch { operator: operator.clone() })?;
        if expected != sv.consensus_pubkey {
            return Err(InvariantViolation::ValidatorKeyMismatch { operator });
        }
    }
    Ok(())
}

/// The bonded pool holds exactly the tokens of bonded validators.
pub fn check_bonded_pool(doc: &GenesisDocument, codec: &GenesisCodec) -> InvariantResult {
    let denom = &doc.staking.params.bond_denom;
    let pool_address = module_account(codec, BONDED_POOL_NAME);

    let pool = doc
        .bank
        .balances
        .iter()
        .filter(|b| b.address == pool_address)
        .try_fold(Coins::empty(), |acc, b| acc.checked_add(&b.coins))
        .map_err(|e| InvariantViolation::UncountableAmount {
            what: "bonded pool balances",
            reason: e.to_string(),
        })?;

    let bonded = doc.staking.validators.bonded_tokens(denom).map_err(|e| {
        InvariantViolation::UncountableAmount {
            what: "bonded validator tokens",
            reason: e.to_string(),
        }
    })?;

    if pool.amount_of(denom) != bonded.amount_of(denom) {
        return Err(InvariantViolation::BondedPoolMismatch { pool, bonded });
    }
    Ok(())
}

/// Delegations only reference validators in the staking set.
pub fn check_delegations(doc: &GenesisDocument) -> InvariantResult {
    let operators: HashSet<&str> = doc
        .staking
        .validators
        .iter()
        .map(|v| v.operator_address.as_str())
        .collect();

    for d in &doc.staking.delegations {
        if !operators.contains(d.validator_address.as_str()) {
            return Err(InvariantViolation::UnknownDelegationValidator {
                delegator: d.delegator_address.clone(),
                validator: d.validator_address.clone(),
            });
        }
    }
    Ok(())
}

/// Balances belong to known accounts or to module pools.
pub fn check_balance_addresses(doc: &GenesisDocument, codec: &GenesisCodec) -> InvariantResult {
    let mut known: HashSet<String> = doc
        .auth
        .accounts
        .iter()
        .map(|a| a.address.clone())
        .collect();
    known.insert(module_account(codec, BONDED_POOL_NAME));
    known.insert(module_account(codec, NOT_BONDED_POOL_NAME));

    for balance in &doc.bank.balances {
        decode_account(codec, &balance.address)?;
        if !known.contains(&balance.address) {
            return Err(InvariantViolation::UnknownBalanceAddress(balance.address.clone()));
        }
    }
    Ok(())
}

/// Every gentx verifies against the document's chain id, registers a
/// validator in the set exactly once and bonds the staking denomination.
pub fn check_gen_txs(doc: &GenesisDocument, codec: &GenesisCodec) -> InvariantResult {
    let operators: HashSet<&str> = doc
        .staking
        .validators
        .iter()
        .map(|v| v.operator_address.as_str())
        .collect();

    let mut registered = HashSet::new();
    for (index, tx) in doc.genutil.gen_txs.iter().enumerate() {
        check_gen_tx(tx, doc, codec, &operators, &mut registered)
            .map_err(|reason| InvariantViolation::GenTxRejected { index, reason })?;
    }
    Ok(())
}

fn check_gen_tx(
    tx: &GenesisTx,
    doc: &GenesisDocument,
    codec: &GenesisCodec,
    operators: &HashSet<&str>,
    registered: &mut HashSet<String>,
) -> Result<(), String> {
    tx.verify(codec, &doc.chain_id).map_err(|e| e.to_string())?;

    let msg = tx
        .create_validator()
        .ok_or_else(|| "no registration message".to_string())?;
    if !operators.contains(msg.validator_address.as_str()) {
        return Err(format!("{} is not in the validator set", msg.validator_address));
    }
    if msg.value.denom != doc.staking.params.bond_denom {
        return Err(format!(
            "bonds {} instead of {}",
            msg.value.denom, doc.staking.params.bond_denom
        ));
    }
    if !registered.insert(msg.validator_address.clone()) {
        return Err(format!("{} is registered twice", msg.validator_address));
    }
    Ok(())
}

fn module_account(codec: &GenesisCodec, name: &str) -> String {
    codec
        .address_codec()
        .encode_account(&Address::new(module_address(name)))
}

fn decode_validator(codec: &GenesisCodec, address: &str) -> Result<Address, InvariantViolation> {
    codec
        .address_codec()
        .decode_validator(address)
        .map_err(|e| InvariantViolation::MalformedAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn decode_account(codec: &GenesisCodec, address: &str) -> Result<Address, InvariantViolation> {
    codec
        .address_codec()
        .decode_account(address)
        .map_err(|e| InvariantViolation::MalformedAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
