//! # Public Key Representations
//!
//! The consensus layer and the ledger layer describe the same validator key in
//! two different ways:
//!
//! - [`ConsensusPubKey`]: what the consensus engine puts in its validator list.
//!   It can name algorithms the ledger knows nothing about.
//! - [`PubKeyEnvelope`]: the ledger's polymorphic wire form, a type URL plus
//!   raw key bytes. Decoding it yields a [`LedgerPubKey`].
//!
//! Converting between the two never falls back silently: an algorithm without
//! a ledger type URL is reported as [`CryptoError::UnsupportedKeyAlgorithm`].

use crate::address::AddressBytes;
use crate::{CryptoError, Ed25519PublicKey, Secp256k1PublicKey};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Type URL of an Ed25519 key inside a ledger envelope.
pub const ED25519_TYPE_URL: &str = "/crypto.ed25519.PubKey";

/// Type URL of a secp256k1 key inside a ledger envelope.
pub const SECP256K1_TYPE_URL: &str = "/crypto.secp256k1.PubKey";

/// BLS12-381 G1 public key (48 bytes compressed).
///
/// Only carried, never used for signing here.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bls12381PublicKey(#[serde_as(as = "Hex")] [u8; 48]);

impl Bls12381PublicKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 48]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }
}

/// Validator key as seen by the consensus engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ConsensusPubKey {
    /// Default validator key.
    #[serde(rename = "consensus/PubKeyEd25519")]
    Ed25519(Ed25519PublicKey),
    /// secp256k1 validator key.
    #[serde(rename = "consensus/PubKeySecp256k1")]
    Secp256k1(Secp256k1PublicKey),
    /// Carried only; has no ledger type URL.
    #[serde(rename = "consensus/PubKeyBls12_381")]
    Bls12381(Bls12381PublicKey),
}

impl ConsensusPubKey {
    /// Algorithm name, as used in consensus params `pub_key_types`.
    pub fn algorithm(&self) -> &'static str {
        match self {
            ConsensusPubKey::Ed25519(_) => "ed25519",
            ConsensusPubKey::Secp256k1(_) => "secp256k1",
            ConsensusPubKey::Bls12381(_) => "bls12_381",
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ConsensusPubKey::Ed25519(pk) => pk.as_bytes(),
            ConsensusPubKey::Secp256k1(pk) => pk.as_bytes(),
            ConsensusPubKey::Bls12381(pk) => pk.as_bytes(),
        }
    }

    /// Consensus address derived from the key bytes.
    pub fn address(&self) -> AddressBytes {
        crate::address::derive_address(self.as_bytes())
    }
}

impl From<Ed25519PublicKey> for ConsensusPubKey {
    fn from(pk: Ed25519PublicKey) -> Self {
        ConsensusPubKey::Ed25519(pk)
    }
}

/// Public key the ledger can verify signatures with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerPubKey {
    /// `/crypto.ed25519.PubKey`
    Ed25519(Ed25519PublicKey),
    /// `/crypto.secp256k1.PubKey`
    Secp256k1(Secp256k1PublicKey),
}

impl LedgerPubKey {
    /// Type URL used in the envelope.
    pub fn type_url(&self) -> &'static str {
        match self {
            LedgerPubKey::Ed25519(_) => ED25519_TYPE_URL,
            LedgerPubKey::Secp256k1(_) => SECP256K1_TYPE_URL,
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LedgerPubKey::Ed25519(pk) => pk.as_bytes(),
            LedgerPubKey::Secp256k1(pk) => pk.as_bytes(),
        }
    }

    /// Address derived from the key bytes.
    pub fn address(&self) -> AddressBytes {
        crate::address::derive_address(self.as_bytes())
    }

    /// Verify a raw 64-byte signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            LedgerPubKey::Ed25519(pk) => pk.verify(message, signature),
            LedgerPubKey::Secp256k1(pk) => pk.verify(message, signature),
        }
    }

    /// Wrap in the ledger's polymorphic envelope.
    pub fn to_envelope(&self) -> PubKeyEnvelope {
        PubKeyEnvelope {
            type_url: self.type_url().to_string(),
            key: self.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<&ConsensusPubKey> for LedgerPubKey {
    type Error = CryptoError;

    fn try_from(pk: &ConsensusPubKey) -> Result<Self, Self::Error> {
        match pk {
            ConsensusPubKey::Ed25519(pk) => Ok(LedgerPubKey::Ed25519(*pk)),
            ConsensusPubKey::Secp256k1(pk) => Ok(LedgerPubKey::Secp256k1(*pk)),
            other => Err(CryptoError::UnsupportedKeyAlgorithm(other.algorithm())),
        }
    }
}

impl From<Secp256k1PublicKey> for LedgerPubKey {
    fn from(pk: Secp256k1PublicKey) -> Self {
        LedgerPubKey::Secp256k1(pk)
    }
}

impl From<Ed25519PublicKey> for LedgerPubKey {
    fn from(pk: Ed25519PublicKey) -> Self {
        LedgerPubKey::Ed25519(pk)
    }
}

/// Ledger wire form of a public key: `{"@type": <url>, "key": <hex>}`.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyEnvelope {
    /// Registered key type.
    #[serde(rename = "@type")]
    pub type_url: String,
    /// Raw key bytes.
    #[serde_as(as = "Hex")]
    pub key: Vec<u8>,
}

impl PubKeyEnvelope {
    /// Decode into a concrete key by type URL.
    pub fn decode(&self) -> Result<LedgerPubKey, CryptoError> {
        match self.type_url.as_str() {
            ED25519_TYPE_URL => Ok(LedgerPubKey::Ed25519(Ed25519PublicKey::from_slice(&self.key)?)),
            SECP256K1_TYPE_URL => Ok(LedgerPubKey::Secp256k1(Secp256k1PublicKey::from_slice(
                &self.key,
            )?)),
            other => Err(CryptoError::UnknownTypeUrl(other.to_string())),
        }
    }
}

/// Convert a consensus key straight into a ledger envelope.
pub fn envelope_from_consensus(pk: &ConsensusPubKey) -> Result<PubKeyEnvelope, CryptoError> {
    Ok(LedgerPubKey::try_from(pk)?.to_envelope())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ed25519KeyPair, Secp256k1KeyPair};
    use k256::ecdsa::{signature::Signer, Signature, SigningKey};

    #[test]
    fn test_ed25519_envelope_roundtrip() {
        let pk = Ed25519KeyPair::generate().public_key();
        let envelope = envelope_from_consensus(&ConsensusPubKey::Ed25519(pk)).unwrap();

        assert_eq!(envelope.type_url, ED25519_TYPE_URL);
        assert_eq!(envelope.decode().unwrap(), LedgerPubKey::Ed25519(pk));
    }

    #[test]
    fn test_bls_key_is_rejected_explicitly() {
        let pk = ConsensusPubKey::Bls12381(Bls12381PublicKey::from_bytes([0xAB; 48]));
        assert_eq!(
            envelope_from_consensus(&pk),
            Err(CryptoError::UnsupportedKeyAlgorithm("bls12_381"))
        );
    }

    #[test]
    fn test_unknown_type_url() {
        let envelope = PubKeyEnvelope {
            type_url: "/crypto.sr25519.PubKey".to_string(),
            key: vec![0; 32],
        };
        assert!(matches!(envelope.decode(), Err(CryptoError::UnknownTypeUrl(_))));
    }

    #[test]
    fn test_envelope_json_shape() {
        let pk = Secp256k1KeyPair::generate().public_key();
        let envelope = LedgerPubKey::from(pk).to_envelope();
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["@type"], SECP256K1_TYPE_URL);
        assert_eq!(value["key"], hex::encode(pk.as_bytes()));
    }

    #[test]
    fn test_consensus_key_json_is_tagged() {
        let pk = Ed25519KeyPair::from_seed([3u8; 32]).public_key();
        let value = serde_json::to_value(ConsensusPubKey::Ed25519(pk)).unwrap();

        assert_eq!(value["type"], "consensus/PubKeyEd25519");
        assert_eq!(value["value"], hex::encode(pk.as_bytes()));
    }

    #[test]
    fn test_ledger_verify_dispatches_by_algorithm() {
        let secp = SigningKey::from_bytes((&[6u8; 32]).into()).unwrap();
        let secp_sig: Signature = secp.sign(b"payload");
        let secp_pk = Secp256k1KeyPair::from_bytes([6u8; 32]).unwrap().public_key();
        let pk = LedgerPubKey::from(secp_pk);

        assert!(pk.verify(b"payload", &secp_sig.to_bytes()).is_ok());
        assert!(pk.verify(b"payload", &secp_sig.to_bytes()[..63]).is_err());

        let ed = Ed25519KeyPair::from_seed([6u8; 32]);
        let pk = LedgerPubKey::from(ed.public_key());
        assert!(pk.verify(b"payload", &ed.sign(b"payload")).is_ok());
        assert!(pk.verify(b"payload", &secp_sig.to_bytes()).is_err());
    }
}
