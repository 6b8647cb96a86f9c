//! End-to-end genesis generation tests.

use genesis_builder::{
    bonded_pool_address, invariants, DelegatorPrivKeys, GenesisBuilder, GenesisCodec,
    GenesisDocument, GenesisError, TestnetGenesis, TestnetGenesisConfig, ValidatorDefaults,
    ValidatorPrivKeys, DEFAULT_DELEGATOR_BALANCE, DEFAULT_POWER_REDUCTION,
};
use proptest::prelude::*;
use shared_types::{Coin, Coins};
use std::collections::HashSet;

fn seeded(config: &TestnetGenesisConfig) -> TestnetGenesis {
    let seeds: Vec<[u8; 32]> = (0..config.validators).map(|i| [i as u8 + 1; 32]).collect();
    let secrets: Vec<[u8; 32]> = (0..config.validators).map(|i| [i as u8 + 101; 32]).collect();
    TestnetGenesis::from_keys(
        config,
        ValidatorPrivKeys::from_seeds(&seeds),
        DelegatorPrivKeys::from_secrets(&secrets).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_two_validator_network() {
    // Arrange
    let config = TestnetGenesisConfig::default();
    let codec = config.codec();

    // Act
    let testnet = TestnetGenesis::generate(&config).unwrap();
    let doc: GenesisDocument = testnet.document(&codec).unwrap();

    // Assert
    assert_eq!(doc.chain_id, "simapp-chain");
    assert_eq!(doc.consensus.validators.len(), 2);
    assert_eq!(doc.staking.validators.len(), 2);
    assert_eq!(doc.auth.accounts.len(), 2);
    assert_eq!(doc.staking.delegations.len(), 2);
    assert_eq!(doc.genutil.gen_txs.len(), 2);
    assert_eq!(doc.bank.balances.len(), 3);

    let pool = bonded_pool_address(codec.address_codec());
    let pool_balance = doc.bank.balances.iter().find(|b| b.address == pool).unwrap();
    assert_eq!(pool_balance.coins.amount_of("stake"), 2 * DEFAULT_POWER_REDUCTION);

    let expected_supply = 2 * DEFAULT_DELEGATOR_BALANCE + 2 * DEFAULT_POWER_REDUCTION;
    assert_eq!(doc.bank.supply.amount_of("stake"), expected_supply);

    for tx in &doc.genutil.gen_txs {
        assert!(tx.verify(&codec, &doc.chain_id).is_ok());
    }
    assert_eq!(invariants::check_all(&doc, &codec), Ok(()));
}

#[test]
fn test_same_keys_same_bytes() {
    let config = TestnetGenesisConfig::default();

    let first = seeded(&config);
    let second = seeded(&config);

    assert_eq!(first.genesis, second.genesis);
    assert_eq!(first.hash(), second.hash());
}

#[test]
fn test_gentx_replay_on_other_chain_rejected() {
    let config = TestnetGenesisConfig::default();
    let codec = config.codec();
    let testnet = seeded(&config);
    let doc = testnet.document(&codec).unwrap();

    let tx = &doc.genutil.gen_txs[0];
    assert!(tx.verify(&codec, "simapp-chain").is_ok());
    assert!(tx.verify(&codec, "other-chain").is_err());
}

#[test]
fn test_gentx_survives_encoding() {
    let config = TestnetGenesisConfig::default();
    let codec = config.codec();
    let testnet = seeded(&config);
    let doc = testnet.document(&codec).unwrap();

    let raw = codec.to_canonical_vec(&doc.genutil.gen_txs[1]).unwrap();
    let decoded = codec.decode_tx(&raw).unwrap();

    assert_eq!(decoded, doc.genutil.gen_txs[1]);
    assert!(decoded.verify(&codec, &doc.chain_id).is_ok());
}

#[test]
fn test_chain_id_required_before_signing() {
    let mut builder = GenesisBuilder::new(GenesisCodec::default());
    let keys = ValidatorPrivKeys::generate(1);
    let vals = keys.consensus_validators(&ValidatorDefaults::default()).unwrap();

    let result = builder.gen_tx(
        keys.get(0).unwrap(),
        vals.get(0).unwrap(),
        Coin::new("stake", 1_000_000).unwrap(),
    );

    assert!(matches!(result, Err(GenesisError::ChainIdNotSet)));
}

#[test]
fn test_tampered_supply_detected() {
    let config = TestnetGenesisConfig::default();
    let codec = config.codec();
    let mut doc = seeded(&config).document(&codec).unwrap();

    doc.bank.supply = Coins::from(Coin::new("stake", 1).unwrap());

    assert!(invariants::check_supply(&doc).is_err());
    assert!(invariants::check_all(&doc, &codec).is_err());
}

#[test]
fn test_custom_prefix_and_denom() {
    let config = TestnetGenesisConfig {
        address_prefix: "cosmos".to_string(),
        defaults: ValidatorDefaults {
            bond_denom: "ustake".to_string(),
            ..ValidatorDefaults::default()
        },
        ..TestnetGenesisConfig::default()
    };
    let codec = config.codec();
    let doc = TestnetGenesis::generate(&config).unwrap().document(&codec).unwrap();

    assert_eq!(doc.staking.params.bond_denom, "ustake");
    assert!(doc.auth.accounts.iter().all(|a| a.address.starts_with("cosmos1")));
    assert!(doc
        .staking
        .validators
        .iter()
        .all(|v| v.operator_address.starts_with("cosmosvaloper1")));
}

#[test]
fn test_encoded_keys_sorted() {
    let config = TestnetGenesisConfig::default();
    let testnet = seeded(&config);
    let text = String::from_utf8(testnet.genesis.clone()).unwrap();

    let auth = text.find("\"auth\"").unwrap();
    let bank = text.find("\"bank\"").unwrap();
    let chain_id = text.find("\"chain_id\"").unwrap();
    assert!(auth < bank && bank < chain_id);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_n_keys_give_n_addresses(n in 0usize..8) {
        let codec = GenesisCodec::default();
        let vals = ValidatorPrivKeys::generate(n)
            .consensus_validators(&ValidatorDefaults::default())
            .unwrap();
        let accounts = DelegatorPrivKeys::generate(n).base_accounts(codec.address_codec());

        let val_addrs: HashSet<_> = vals.iter().map(|v| v.address).collect();
        let acct_addrs: HashSet<_> = accounts.iter().map(|a| a.address.clone()).collect();

        prop_assert_eq!(val_addrs.len(), n);
        prop_assert_eq!(acct_addrs.len(), n);
        prop_assert_eq!(vals.is_empty(), n == 0);
        prop_assert_eq!(accounts.is_empty(), n == 0);
    }

    #[test]
    fn prop_supply_matches_balances(n in 1usize..5, balance in 1u128..1_000_000_000_000u128) {
        let config = TestnetGenesisConfig {
            validators: n,
            delegator_balance: balance,
            ..TestnetGenesisConfig::default()
        };
        let testnet = TestnetGenesis::generate(&config).unwrap();

        let summed = Coins::sum(testnet.balances.iter().map(|b| &b.coins)).unwrap();
        prop_assert_eq!(&summed, &testnet.total_supply);
        prop_assert_eq!(
            testnet.total_supply.amount_of("stake"),
            n as u128 * (balance + DEFAULT_POWER_REDUCTION)
        );
    }
}
