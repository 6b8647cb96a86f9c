//! # Testnet Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ```text
//! tests/
//! ├── benches/       # criterion: genesis generation, gentx verification
//! └── src/
//!     └── integration/
//!         ├── genesis_to_network.rs   # generate → write → boot → query
//!         └── tampered_genesis.rs     # broken documents never boot
//! ```
//!
//! ```bash
//! cargo test -p testnet-tests
//! cargo bench -p testnet-tests
//! ```

pub mod integration;
