//! # secp256k1 Account Keys
//!
//! Delegator accounts are addressed by the compressed secp256k1 public key.
//! A validator may also name a secp256k1 consensus key, so the public key can
//! check signatures; genesis construction never signs with one.

use crate::address::{derive_address, AddressBytes};
use crate::CryptoError;
use k256::ecdsa::{signature::Verifier, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;

/// Compressed SEC1 encoding length.
pub const SECP256K1_PUBLIC_KEY_LEN: usize = 33;

/// Compressed secp256k1 public key.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secp256k1PublicKey(#[serde_as(as = "Hex")] [u8; SECP256K1_PUBLIC_KEY_LEN]);

impl Secp256k1PublicKey {
    /// Parse compressed key bytes (`0x02`/`0x03` prefix).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SECP256K1_PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SECP256K1_PUBLIC_KEY_LEN,
                actual: bytes.len(),
            })?;
        VerifyingKey::from_sec1_bytes(&key).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(key))
    }

    /// Compressed key bytes.
    pub fn as_bytes(&self) -> &[u8; SECP256K1_PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Account address of the key.
    pub fn address(&self) -> AddressBytes {
        derive_address(&self.0)
    }

    /// Verify a raw `r || s` signature.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|_| CryptoError::InvalidPublicKey)?
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Delegator account key.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Fresh key from the thread RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Key from a 32-byte secret scalar. Zero and out-of-range scalars fail.
    pub fn from_bytes(secret: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&secret).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Compressed public key.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; SECP256K1_PUBLIC_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        Secp256k1PublicKey(bytes)
    }
}

impl fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
