//! # genesis-builder
//!
//! Genesis construction for local test networks.
//!
//! ## Architecture
//!
//! ```text
//! ValidatorPrivKeys ──→ ConsensusValidators ──→ StakingValidators ─┐
//!                                   │                               │
//! DelegatorPrivKeys ──→ BaseAccounts ──→ Balances / Delegations ────┤
//!                                                                   ↓
//!                                   GenesisBuilder ──gen_tx──→ encode()
//!                                                                   │
//!                                        invariants::check_all ←────┘
//! ```
//!
//! - `domain`: records, params and key material
//! - `codec`: canonical JSON and the type registry
//! - `builder`: fragment accumulation and encoding
//! - `invariants`: cross-fragment consistency checks
//! - `testnet`: the whole pipeline for an n-validator network
//!
//! ## Usage
//!
//! ```rust,ignore
//! use genesis_builder::{TestnetGenesis, TestnetGenesisConfig};
//!
//! let testnet = TestnetGenesis::generate(&TestnetGenesisConfig::default())?;
//! std::fs::write("genesis.json", &testnet.genesis)?;
//! ```

pub mod builder;
pub mod codec;
pub mod domain;
pub mod invariants;
pub mod testnet;

pub use builder::GenesisBuilder;
pub use codec::{GenesisCodec, InterfaceRegistry};
pub use domain::*;
pub use testnet::{TestnetGenesis, TestnetGenesisConfig, DEFAULT_DELEGATOR_BALANCE};
