//! # testnet
//!
//! Generates a genesis for an n-validator network, writes it into one home
//! per validator and runs the nodes in-process until Ctrl+C.
//!
//! ## Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TESTNET_VALIDATORS` | 2 |
//! | `TESTNET_CHAIN_ID` | `simapp-chain` |
//! | `TESTNET_ROOT` | `{tmp}/testnet` |
//! | `TESTNET_DELEGATOR_BALANCE` | 10000000000000 |
//! | `TESTNET_LOG_LEVEL` | `info` |

use anyhow::{Context, Result};
use genesis_builder::{TestnetGenesis, TestnetGenesisConfig};
use node_runtime::{simapp_factory, Testnet, TestnetConfig};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Parse `name` if it is set; warn and keep the default otherwise.
fn env_override<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("{name}={raw:?} is not valid, keeping default"),
        }
    }
}

/// Defaults with environment overrides applied.
fn load_config() -> (TestnetGenesisConfig, TestnetConfig) {
    let mut genesis = TestnetGenesisConfig::default();
    let mut testnet = TestnetConfig::default();

    env_override("TESTNET_VALIDATORS", &mut genesis.validators);
    env_override("TESTNET_DELEGATOR_BALANCE", &mut genesis.delegator_balance);
    env_override("TESTNET_CHAIN_ID", &mut genesis.chain_id);
    if let Ok(root) = std::env::var("TESTNET_ROOT") {
        testnet.root_dir = PathBuf::from(root);
    }

    testnet.chain_id = genesis.chain_id.clone();
    testnet.address_prefix = genesis.address_prefix.clone();
    (genesis, testnet)
}

fn log_level() -> Level {
    std::env::var("TESTNET_LOG_LEVEL")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(Level::INFO)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (genesis_config, testnet_config) = load_config();

    let generated = TestnetGenesis::generate(&genesis_config).context("generating genesis")?;
    info!(
        chain_id = %genesis_config.chain_id,
        validators = genesis_config.validators,
        hash = %generated.hash(),
        "Genesis generated"
    );

    let testnet = Testnet::start(
        &testnet_config,
        &generated.genesis,
        &generated.validator_keys,
        simapp_factory(&testnet_config.chain_id, testnet_config.codec()),
    )
    .await
    .with_context(|| format!("starting testnet under {}", testnet_config.root_dir.display()))?;

    for node in testnet.nodes() {
        info!(
            moniker = node.moniker(),
            p2p = %node.p2p_address(),
            rpc = ?node.rpc_address(),
            "Node ready"
        );
    }

    info!("Testnet is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    testnet.shutdown().await;
    Ok(())
}
