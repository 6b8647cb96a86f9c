//! End-to-end flows across genesis-builder and node-runtime.

#[cfg(test)]
mod genesis_to_network;
#[cfg(test)]
mod tampered_genesis;

#[cfg(test)]
pub(crate) mod fixtures {
    use genesis_builder::{TestnetGenesis, TestnetGenesisConfig};
    use node_runtime::{simapp_factory, BootstrapResult, Testnet, TestnetConfig};
    use std::path::Path;

    pub fn testnet_config(root: &Path, genesis: &TestnetGenesisConfig) -> TestnetConfig {
        TestnetConfig {
            root_dir: root.to_path_buf(),
            chain_id: genesis.chain_id.clone(),
            address_prefix: genesis.address_prefix.clone(),
            ..TestnetConfig::default()
        }
    }

    /// Seeded keys, so every run produces the same document.
    pub fn seeded_genesis(config: &TestnetGenesisConfig) -> TestnetGenesis {
        let seeds: Vec<[u8; 32]> = (0..config.validators).map(|i| [i as u8 + 1; 32]).collect();
        let secrets: Vec<[u8; 32]> = (0..config.validators).map(|i| [i as u8 + 64; 32]).collect();
        TestnetGenesis::from_keys(
            config,
            genesis_builder::ValidatorPrivKeys::from_seeds(&seeds),
            genesis_builder::DelegatorPrivKeys::from_secrets(&secrets).unwrap(),
        )
        .unwrap()
    }

    pub async fn boot(
        config: &TestnetConfig,
        generated: &TestnetGenesis,
        genesis_bytes: &[u8],
    ) -> BootstrapResult<Testnet> {
        Testnet::start(
            config,
            genesis_bytes,
            &generated.validator_keys,
            simapp_factory(&config.chain_id, config.codec()),
        )
        .await
    }
}
