//! Canonical JSON codec and type registry.
//!
//! Everything that is hashed or signed goes through [`GenesisCodec`]: values
//! are lowered to `serde_json::Value`, object keys are sorted recursively and
//! the result is written without whitespace. Same value, same bytes.
//!
//! Which public key types and message types may appear in a document is
//! decided by the [`InterfaceRegistry`] held by the codec, not by any
//! process-wide table.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared_crypto::{LedgerPubKey, PubKeyEnvelope, ED25519_TYPE_URL, SECP256K1_TYPE_URL};
use shared_types::AddressCodec;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{GenesisError, GenesisResult, GenesisTx, MSG_CREATE_VALIDATOR_TYPE_URL};

/// Type URLs allowed in decoded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRegistry {
    pub_keys: BTreeSet<String>,
    msgs: BTreeSet<String>,
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_pub_key(ED25519_TYPE_URL)
            .register_pub_key(SECP256K1_TYPE_URL)
            .register_msg(MSG_CREATE_VALIDATOR_TYPE_URL);
        registry
    }
}

impl InterfaceRegistry {
    /// Registry that accepts nothing.
    pub fn empty() -> Self {
        Self {
            pub_keys: BTreeSet::new(),
            msgs: BTreeSet::new(),
        }
    }

    pub fn register_pub_key(&mut self, type_url: &str) -> &mut Self {
        self.pub_keys.insert(type_url.to_string());
        self
    }

    pub fn register_msg(&mut self, type_url: &str) -> &mut Self {
        self.msgs.insert(type_url.to_string());
        self
    }

    pub fn check_pub_key(&self, type_url: &str) -> GenesisResult<()> {
        if self.pub_keys.contains(type_url) {
            Ok(())
        } else {
            Err(GenesisError::UnregisteredType(type_url.to_string()))
        }
    }

    pub fn check_msg(&self, type_url: &str) -> GenesisResult<()> {
        if self.msgs.contains(type_url) {
            Ok(())
        } else {
            Err(GenesisError::UnregisteredType(type_url.to_string()))
        }
    }

    /// Decode an envelope whose type URL is registered.
    pub fn resolve_pub_key(&self, envelope: &PubKeyEnvelope) -> GenesisResult<LedgerPubKey> {
        self.check_pub_key(&envelope.type_url)?;
        Ok(envelope.decode()?)
    }
}

/// Canonical encoder/decoder for genesis documents and sign payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisCodec {
    addresses: AddressCodec,
    registry: InterfaceRegistry,
}

impl GenesisCodec {
    pub fn new(addresses: AddressCodec, registry: InterfaceRegistry) -> Self {
        Self { addresses, registry }
    }

    /// Default registry, addresses rendered with `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self::new(AddressCodec::new(prefix), InterfaceRegistry::default())
    }

    pub fn address_codec(&self) -> &AddressCodec {
        &self.addresses
    }

    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// JSON value with every object's keys in sorted order.
    pub fn to_canonical_value<T: Serialize + ?Sized>(&self, value: &T) -> GenesisResult<Value> {
        Ok(canonicalize(serde_json::to_value(value)?))
    }

    /// Compact canonical JSON bytes.
    pub fn to_canonical_vec<T: Serialize + ?Sized>(&self, value: &T) -> GenesisResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_canonical_value(value)?)?)
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> GenesisResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a genesis transaction, rejecting unregistered type URLs before
    /// any typed decoding happens.
    pub fn decode_tx(&self, bytes: &[u8]) -> GenesisResult<GenesisTx> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.check_tx_types(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Walk a raw transaction and check every type URL it names.
    pub fn check_tx_types(&self, tx: &Value) -> GenesisResult<()> {
        let messages = tx["body"]["messages"].as_array().into_iter().flatten();
        for msg in messages {
            self.registry.check_msg(type_url_of(msg)?)?;
            if let Some(pubkey) = msg.get("pubkey") {
                self.registry.check_pub_key(type_url_of(pubkey)?)?;
            }
        }

        let signers = tx["auth_info"]["signer_infos"].as_array().into_iter().flatten();
        for signer in signers {
            self.registry.check_pub_key(type_url_of(&signer["public_key"])?)?;
        }
        Ok(())
    }
}

fn type_url_of(value: &Value) -> GenesisResult<&str> {
    value["@type"]
        .as_str()
        .ok_or_else(|| GenesisError::InvalidGenTx("missing @type".to_string()))
}

/// Rebuild every object with its keys inserted in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Unordered {
        zeta: u8,
        alpha: Inner,
    }

    #[derive(Serialize)]
    struct Inner {
        y: u8,
        b: u8,
    }

    #[test]
    fn test_keys_sorted_recursively() {
        let codec = GenesisCodec::default();
        let bytes = codec
            .to_canonical_vec(&Unordered {
                zeta: 1,
                alpha: Inner { y: 2, b: 3 },
            })
            .unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"alpha":{"b":3,"y":2},"zeta":1}"#
        );
    }

    #[test]
    fn test_encoding_is_stable() {
        let codec = GenesisCodec::default();
        let value = serde_json::json!({"b": [1, {"d": 1, "c": 2}], "a": null});
        assert_eq!(
            codec.to_canonical_vec(&value).unwrap(),
            codec.to_canonical_vec(&value).unwrap()
        );
    }

    #[test]
    fn test_registry_defaults() {
        let registry = InterfaceRegistry::default();
        assert!(registry.check_pub_key(ED25519_TYPE_URL).is_ok());
        assert!(registry.check_pub_key(SECP256K1_TYPE_URL).is_ok());
        assert!(registry.check_msg(MSG_CREATE_VALIDATOR_TYPE_URL).is_ok());
        assert!(matches!(
            registry.check_pub_key("/crypto.bls12_381.PubKey"),
            Err(GenesisError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_empty_registry_rejects_keys() {
        let registry = InterfaceRegistry::empty();
        let envelope = PubKeyEnvelope {
            type_url: ED25519_TYPE_URL.to_string(),
            key: vec![0; 32],
        };
        assert!(matches!(
            registry.resolve_pub_key(&envelope),
            Err(GenesisError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_decode_tx_rejects_unknown_message() {
        let codec = GenesisCodec::default();
        let raw = br#"{"body":{"messages":[{"@type":"/bank.MsgSend"}],"memo":"","timeout_height":"0"},
                      "auth_info":{"signer_infos":[],"fee":{"amount":[],"gas_limit":"0"}},
                      "signatures":[]}"#;

        assert!(matches!(
            codec.decode_tx(raw),
            Err(GenesisError::UnregisteredType(url)) if url == "/bank.MsgSend"
        ));
    }
}
