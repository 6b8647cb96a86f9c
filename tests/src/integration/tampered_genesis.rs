//! A broken genesis must never boot a node, and must leave no node running.

use genesis_builder::{GenesisError, InvariantViolation, TestnetGenesisConfig};
use node_runtime::{BootstrapError, DiskConfig};
use serde_json::Value;
use tempfile::TempDir;

use super::fixtures::{boot, seeded_genesis, testnet_config};

fn edit(genesis: &[u8], f: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut value: Value = serde_json::from_slice(genesis).unwrap();
    f(&mut value);
    serde_json::to_vec(&value).unwrap()
}

fn genesis_error(result: Result<node_runtime::Testnet, BootstrapError>) -> GenesisError {
    match result {
        Err(BootstrapError::NodeStart { index: 0, source }) => match *source {
            BootstrapError::Genesis(e) => e,
            other => panic!("expected a genesis error, got {other}"),
        },
        Err(other) => panic!("expected NodeStart for node 0, got {other}"),
        Ok(_) => panic!("tampered genesis booted"),
    }
}

#[tokio::test]
async fn test_tampered_gentx_memo() {
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig::default();
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    let bytes = edit(&generated.genesis, |v| {
        v["genutil"]["gen_txs"][0]["body"]["memo"] = Value::String("not what was signed".into());
    });

    let err = genesis_error(boot(&config, &generated, &bytes).await);
    assert!(matches!(
        err,
        GenesisError::Invariant(InvariantViolation::GenTxRejected { index: 0, .. })
    ));
}

#[tokio::test]
async fn test_inflated_supply() {
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig::default();
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    let bytes = edit(&generated.genesis, |v| {
        v["bank"]["supply"][0]["amount"] = Value::String("999999999999999999".into());
    });

    let err = genesis_error(boot(&config, &generated, &bytes).await);
    assert!(matches!(
        err,
        GenesisError::Invariant(InvariantViolation::SupplyMismatch { .. })
    ));

    // the failed node released its home
    assert!(DiskConfig::new(config.node_config(0)).is_ok());
}

#[tokio::test]
async fn test_not_json() {
    let dir = TempDir::new().unwrap();
    let genesis_config = TestnetGenesisConfig::default();
    let config = testnet_config(dir.path(), &genesis_config);
    let generated = seeded_genesis(&genesis_config);

    let err = genesis_error(boot(&config, &generated, b"not json").await);
    assert!(matches!(err, GenesisError::Json(_)));
}
