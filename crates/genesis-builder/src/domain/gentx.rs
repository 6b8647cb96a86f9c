//! Genesis transactions.
//!
//! A genesis transaction is a signed validator self-registration
//! (`MsgCreateValidator`) that the chain replays when it starts. The
//! signature covers the chain id, so a gentx produced for one network is
//! rejected on any other.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use shared_crypto::{Ed25519KeyPair, LedgerPubKey, PubKeyEnvelope};
use shared_types::{Address, AddressCodec, Amount, Coin, Coins};
use tracing::debug;

use super::params::CommissionRates;
use super::validator::Description;
use super::{GenesisError, GenesisResult};
use crate::codec::GenesisCodec;

/// Type URL of [`MsgCreateValidator`].
pub const MSG_CREATE_VALIDATOR_TYPE_URL: &str = "/staking.MsgCreateValidator";

// =============================================================================
// MESSAGES
// =============================================================================

/// Register a validator and self-delegate `value` to it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateValidator {
    pub description: Description,
    pub commission: CommissionRates,
    #[serde_as(as = "DisplayFromStr")]
    pub min_self_delegation: Amount,
    pub validator_address: String,
    pub pubkey: PubKeyEnvelope,
    pub value: Coin,
}

impl MsgCreateValidator {
    /// Stateless checks, run before anything is signed.
    pub fn validate_basic(&self, codec: &AddressCodec) -> GenesisResult<()> {
        codec
            .decode_validator(&self.validator_address)
            .map_err(|e| GenesisError::InvalidMessage(format!("validator address: {e}")))?;

        self.pubkey
            .decode()
            .map_err(|e| GenesisError::InvalidMessage(format!("pubkey: {e}")))?;

        shared_types::validate_denom(&self.value.denom)?;
        if self.value.is_zero() {
            return Err(GenesisError::InvalidMessage(
                "self delegation amount must be positive".to_string(),
            ));
        }

        if self.description.moniker.trim().is_empty() {
            return Err(GenesisError::InvalidMessage("empty moniker".to_string()));
        }

        self.commission.validate()?;

        if self.min_self_delegation == 0 {
            return Err(GenesisError::InvalidMessage(
                "minimum self delegation must be positive".to_string(),
            ));
        }
        if self.value.amount < self.min_self_delegation {
            return Err(GenesisError::InvalidMessage(format!(
                "self delegation {} below minimum {}",
                self.value.amount, self.min_self_delegation
            )));
        }

        Ok(())
    }
}

/// A message tagged with its type URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TxMsg {
    #[serde(rename = "/staking.MsgCreateValidator")]
    CreateValidator(MsgCreateValidator),
}

impl TxMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            TxMsg::CreateValidator(_) => MSG_CREATE_VALIDATOR_TYPE_URL,
        }
    }
}

// =============================================================================
// TRANSACTION ENVELOPE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignMode {
    #[serde(rename = "SIGN_MODE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "SIGN_MODE_DIRECT")]
    Direct,
}

impl SignMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignMode::Unspecified => "SIGN_MODE_UNSPECIFIED",
            SignMode::Direct => "SIGN_MODE_DIRECT",
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<TxMsg>,
    pub memo: String,
    #[serde_as(as = "DisplayFromStr")]
    pub timeout_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleMode {
    pub mode: SignMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub single: SingleMode,
}

impl ModeInfo {
    pub fn single(mode: SignMode) -> Self {
        Self {
            single: SingleMode { mode },
        }
    }

    pub fn mode(&self) -> SignMode {
        self.single.mode
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub public_key: PubKeyEnvelope,
    pub mode_info: ModeInfo,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Coins,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

/// Who signs, and for which chain.
///
/// Genesis transactions are replayed before any account exists, so there is
/// no account number or sequence to commit to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerData<'a> {
    #[serde(skip)]
    pub chain_id: &'a str,
    pub address: String,
    pub pub_key: &'a PubKeyEnvelope,
}

#[derive(Serialize)]
struct SignDoc<'a> {
    chain_id: &'a str,
    signer: &'a SignerData<'a>,
    body: &'a TxBody,
    auth_info: &'a AuthInfo,
}

/// Canonical bytes a signer commits to.
pub fn sign_bytes(
    codec: &GenesisCodec,
    mode: SignMode,
    signer: &SignerData<'_>,
    body: &TxBody,
    auth_info: &AuthInfo,
) -> GenesisResult<Vec<u8>> {
    match mode {
        SignMode::Direct => codec.to_canonical_vec(&SignDoc {
            chain_id: signer.chain_id,
            signer,
            body,
            auth_info,
        }),
        SignMode::Unspecified => Err(GenesisError::UnsupportedSignMode(mode.as_str())),
    }
}

/// Signed genesis transaction. Built once by [`GenesisTx::sign`], never
/// mutated afterwards.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisTx {
    body: TxBody,
    auth_info: AuthInfo,
    #[serde_as(as = "Vec<Hex>")]
    signatures: Vec<Vec<u8>>,
}

impl GenesisTx {
    /// Validate, sign for `chain_id` and seal a self-registration.
    pub fn sign(
        codec: &GenesisCodec,
        chain_id: &str,
        key: &Ed25519KeyPair,
        msg: MsgCreateValidator,
    ) -> GenesisResult<Self> {
        if chain_id.is_empty() {
            return Err(GenesisError::ChainIdNotSet);
        }
        msg.validate_basic(codec.address_codec())?;

        let public_key = LedgerPubKey::from(key.public_key());
        let envelope = public_key.to_envelope();
        let signer_address = codec
            .address_codec()
            .encode_validator(&Address::new(public_key.address()));

        let body = TxBody {
            messages: vec![TxMsg::CreateValidator(msg)],
            memo: String::new(),
            timeout_height: 0,
        };
        let auth_info = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: envelope.clone(),
                mode_info: ModeInfo::single(SignMode::Direct),
                sequence: 0,
            }],
            fee: Fee::default(),
        };

        let signer = SignerData {
            chain_id,
            address: signer_address,
            pub_key: &envelope,
        };
        let bytes = sign_bytes(codec, SignMode::Direct, &signer, &body, &auth_info)?;
        let signature = key.sign(&bytes);

        debug!(chain_id, signer = %signer.address, "Signed genesis transaction");

        Ok(Self {
            body,
            auth_info,
            signatures: vec![signature.to_vec()],
        })
    }

    /// Check structure, registration and signature against `chain_id`.
    pub fn verify(&self, codec: &GenesisCodec, chain_id: &str) -> GenesisResult<()> {
        let msg = match self.body.messages.as_slice() {
            [TxMsg::CreateValidator(msg)] => msg,
            other => {
                return Err(GenesisError::InvalidGenTx(format!(
                    "expected one message, found {}",
                    other.len()
                )))
            }
        };
        let signer_info = match self.auth_info.signer_infos.as_slice() {
            [info] => info,
            other => {
                return Err(GenesisError::InvalidGenTx(format!(
                    "expected one signer, found {}",
                    other.len()
                )))
            }
        };
        let signature = match self.signatures.as_slice() {
            [sig] => sig,
            other => {
                return Err(GenesisError::InvalidGenTx(format!(
                    "expected one signature, found {}",
                    other.len()
                )))
            }
        };

        for m in &self.body.messages {
            codec.registry().check_msg(m.type_url())?;
        }
        msg.validate_basic(codec.address_codec())?;

        let public_key = codec.registry().resolve_pub_key(&signer_info.public_key)?;
        if signer_info.public_key != msg.pubkey {
            return Err(GenesisError::InvalidGenTx(
                "signer key differs from the registered validator key".to_string(),
            ));
        }

        let signer_address = codec
            .address_codec()
            .encode_validator(&Address::new(public_key.address()));
        if signer_address != msg.validator_address {
            return Err(GenesisError::InvalidGenTx(format!(
                "signer {signer_address} is not validator {}",
                msg.validator_address
            )));
        }

        let signer = SignerData {
            chain_id,
            address: signer_address,
            pub_key: &signer_info.public_key,
        };
        let bytes = sign_bytes(
            codec,
            signer_info.mode_info.mode(),
            &signer,
            &self.body,
            &self.auth_info,
        )?;
        public_key
            .verify(&bytes, signature)
            .map_err(|_| GenesisError::SignatureInvalid)
    }

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }

    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    /// The registration this transaction carries.
    pub fn create_validator(&self) -> Option<&MsgCreateValidator> {
        self.body.messages.first().map(|m| match m {
            TxMsg::CreateValidator(msg) => msg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg_for(codec: &GenesisCodec, key: &Ed25519KeyPair) -> MsgCreateValidator {
        let public_key = LedgerPubKey::from(key.public_key());
        MsgCreateValidator {
            description: Description::with_moniker("val-0"),
            commission: CommissionRates::default(),
            min_self_delegation: 1,
            validator_address: codec
                .address_codec()
                .encode_validator(&Address::new(public_key.address())),
            pubkey: public_key.to_envelope(),
            value: Coin::new("stake", 1_000_000).unwrap(),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();

        let tx = GenesisTx::sign(&codec, "test-chain", &key, msg_for(&codec, &key)).unwrap();

        assert_eq!(tx.signatures().len(), 1);
        assert_eq!(tx.auth_info().signer_infos[0].mode_info.mode(), SignMode::Direct);
        assert!(tx.verify(&codec, "test-chain").is_ok());
    }

    #[test]
    fn test_other_chain_rejects_signature() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let tx = GenesisTx::sign(&codec, "chain-a", &key, msg_for(&codec, &key)).unwrap();

        let result = tx.verify(&codec, "chain-b");
        assert!(matches!(result, Err(GenesisError::SignatureInvalid)));
    }

    #[test]
    fn test_empty_chain_id_refused() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let result = GenesisTx::sign(&codec, "", &key, msg_for(&codec, &key));
        assert!(matches!(result, Err(GenesisError::ChainIdNotSet)));
    }

    #[test]
    fn test_validate_basic_failures() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let good = msg_for(&codec, &key);

        let mut msg = good.clone();
        msg.description.moniker.clear();
        assert!(msg.validate_basic(codec.address_codec()).is_err());

        let mut msg = good.clone();
        msg.min_self_delegation = 0;
        assert!(msg.validate_basic(codec.address_codec()).is_err());

        let mut msg = good.clone();
        msg.value.amount = 0;
        assert!(msg.validate_basic(codec.address_codec()).is_err());

        let mut msg = good.clone();
        msg.validator_address = "nope".to_string();
        assert!(msg.validate_basic(codec.address_codec()).is_err());

        let mut msg = good;
        msg.pubkey.type_url = "/crypto.unknown.PubKey".to_string();
        assert!(msg.validate_basic(codec.address_codec()).is_err());
    }

    #[test]
    fn test_signing_with_foreign_key_rejected() {
        let codec = GenesisCodec::default();
        let validator = Ed25519KeyPair::generate();
        let intruder = Ed25519KeyPair::generate();

        let tx = GenesisTx::sign(&codec, "c", &intruder, msg_for(&codec, &validator)).unwrap();
        assert!(matches!(tx.verify(&codec, "c"), Err(GenesisError::InvalidGenTx(_))));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let mut tx = GenesisTx::sign(&codec, "c", &key, msg_for(&codec, &key)).unwrap();

        tx.body.memo = "tampered".to_string();
        assert!(matches!(tx.verify(&codec, "c"), Err(GenesisError::SignatureInvalid)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let mut tx = GenesisTx::sign(&codec, "c", &key, msg_for(&codec, &key)).unwrap();

        tx.signatures[0][0] ^= 0xFF;
        assert!(matches!(tx.verify(&codec, "c"), Err(GenesisError::SignatureInvalid)));
    }

    #[test]
    fn test_unspecified_mode_has_no_sign_bytes() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let envelope = LedgerPubKey::from(key.public_key()).to_envelope();
        let body = TxBody {
            messages: vec![],
            memo: String::new(),
            timeout_height: 0,
        };
        let auth_info = AuthInfo {
            signer_infos: vec![],
            fee: Fee::default(),
        };
        let signer = SignerData {
            chain_id: "c",
            address: String::new(),
            pub_key: &envelope,
        };

        let result = sign_bytes(&codec, SignMode::Unspecified, &signer, &body, &auth_info);
        assert!(matches!(result, Err(GenesisError::UnsupportedSignMode(_))));
    }

    #[test]
    fn test_message_json_is_type_tagged() {
        let codec = GenesisCodec::default();
        let key = Ed25519KeyPair::generate();
        let tx = GenesisTx::sign(&codec, "c", &key, msg_for(&codec, &key)).unwrap();

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["body"]["messages"][0]["@type"], MSG_CREATE_VALIDATOR_TYPE_URL);
        assert_eq!(json["body"]["messages"][0]["value"]["amount"], "1000000");
    }
}
