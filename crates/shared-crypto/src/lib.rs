//! # Shared Crypto - Key Primitives for Genesis Construction
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Consensus (validator) keys, node identity |
//! | `ecdsa` | secp256k1 | Ledger (delegator) account keys |
//! | `pubkey` | - | Consensus key vs. ledger key envelope |
//! | `address` | SHA-256 | Address derivation, module addresses |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency
//! - **secp256k1**: account keys; verification only, never used to sign
//! - Signing keys zeroize on drop; exported seeds are `Zeroizing`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod ecdsa;
pub mod errors;
pub mod pubkey;
pub mod signatures;

// Re-exports
pub use address::{derive_address, module_address, sha256, AddressBytes, ADDRESS_LEN};
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use errors::CryptoError;
pub use pubkey::{
    envelope_from_consensus, Bls12381PublicKey, ConsensusPubKey, LedgerPubKey, PubKeyEnvelope,
    ED25519_TYPE_URL, SECP256K1_TYPE_URL,
};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey};
