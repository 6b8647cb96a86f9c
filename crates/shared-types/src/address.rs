//! # Addresses
//!
//! A 20-byte [`Address`] is rendered three ways:
//!
//! - consensus layer: upper-case hex (`Display`, JSON)
//! - ledger accounts: `{account_prefix}1{lower hex}`
//! - validator operators: `{validator_prefix}1{lower hex}`
//!
//! The prefixes live in an [`AddressCodec`] value that is passed to whoever
//! renders or parses ledger addresses. There is no process-wide prefix
//! configuration.

use serde::{Deserialize, Serialize};
use serde_with::{formats::Uppercase, hex::Hex, serde_as};
use std::fmt;

use crate::TypeError;

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;

/// 20-byte address shared by the consensus and ledger layers.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(#[serde_as(as = "Hex<Uppercase>")] [u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// Separator between the human-readable prefix and the address body.
const SEPARATOR: char = '1';

/// Renders and parses prefixed ledger addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCodec {
    /// Prefix for ordinary accounts (delegators, module accounts).
    pub account_prefix: String,
    /// Prefix for validator operator addresses.
    pub validator_prefix: String,
}

impl Default for AddressCodec {
    fn default() -> Self {
        Self::new("testnet")
    }
}

impl AddressCodec {
    /// Codec with `{prefix}` for accounts and `{prefix}valoper` for operators.
    pub fn new(prefix: &str) -> Self {
        Self {
            account_prefix: prefix.to_string(),
            validator_prefix: format!("{prefix}valoper"),
        }
    }

    pub fn encode_account(&self, address: &Address) -> String {
        encode(&self.account_prefix, address)
    }

    pub fn encode_validator(&self, address: &Address) -> String {
        encode(&self.validator_prefix, address)
    }

    pub fn decode_account(&self, s: &str) -> Result<Address, TypeError> {
        decode(&self.account_prefix, s)
    }

    pub fn decode_validator(&self, s: &str) -> Result<Address, TypeError> {
        decode(&self.validator_prefix, s)
    }
}

fn encode(prefix: &str, address: &Address) -> String {
    format!("{prefix}{SEPARATOR}{}", hex::encode(address.0))
}

fn decode(prefix: &str, s: &str) -> Result<Address, TypeError> {
    let body = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .ok_or_else(|| TypeError::WrongAddressPrefix {
            address: s.to_string(),
            expected: prefix.to_string(),
        })?;

    // Upper-case bodies are rejected so each address has one spelling.
    if body.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(TypeError::MalformedAddress(s.to_string()));
    }

    let bytes = hex::decode(body).map_err(|_| TypeError::MalformedAddress(s.to_string()))?;
    let arr: [u8; ADDRESS_LEN] = bytes
        .try_into()
        .map_err(|_| TypeError::MalformedAddress(s.to_string()))?;
    Ok(Address(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_roundtrip() {
        let codec = AddressCodec::new("sim");
        let addr = Address::new([0xAB; ADDRESS_LEN]);

        let encoded = codec.encode_account(&addr);
        assert!(encoded.starts_with("sim1"));
        assert_eq!(codec.decode_account(&encoded).unwrap(), addr);
    }

    #[test]
    fn test_validator_prefix_is_distinct() {
        let codec = AddressCodec::new("sim");
        let addr = Address::new([1; ADDRESS_LEN]);

        let val = codec.encode_validator(&addr);
        assert!(val.starts_with("simvaloper1"));
        assert!(codec.decode_account(&val).is_err());
        assert_eq!(codec.decode_validator(&val).unwrap(), addr);
    }

    #[test]
    fn test_malformed_bodies() {
        let codec = AddressCodec::new("sim");
        assert!(matches!(
            codec.decode_account("sim1zz"),
            Err(TypeError::MalformedAddress(_))
        ));
        assert!(matches!(
            codec.decode_account("sim1abcd"),
            Err(TypeError::MalformedAddress(_))
        ));
        assert!(matches!(
            codec.decode_account("other1abcd"),
            Err(TypeError::WrongAddressPrefix { .. })
        ));
    }

    #[test]
    fn test_consensus_form_is_upper_hex() {
        let addr = Address::new([0xAB; ADDRESS_LEN]);
        assert_eq!(addr.to_string(), "AB".repeat(ADDRESS_LEN));
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            format!("\"{}\"", "AB".repeat(ADDRESS_LEN))
        );
    }
}
