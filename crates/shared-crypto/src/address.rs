//! # Address Derivation
//!
//! Addresses are the first 20 bytes of SHA-256 over the public key bytes.
//! Module accounts (staking pools and the like) have no key; their address is
//! derived from the module name the same way.

use sha2::{Digest, Sha256};

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Raw address bytes.
pub type AddressBytes = [u8; ADDRESS_LEN];

/// Derive an address from public key bytes.
pub fn derive_address(pubkey: &[u8]) -> AddressBytes {
    let hash = Sha256::digest(pubkey);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[..ADDRESS_LEN]);
    address
}

/// Address owned by a protocol module rather than a keypair.
pub fn module_address(module_name: &str) -> AddressBytes {
    derive_address(module_name.as_bytes())
}

/// SHA-256 digest, used for genesis hashes and node identities.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
