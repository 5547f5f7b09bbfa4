//! TrustReceipt: the atomic unit of the audit ledger.
//!
//! A receipt is an immutable, signed record of one AI interaction. It is
//! created exactly once; there is no update or delete. Its identity, chain
//! hash, and signature are all derived from the same canonical serialization
//! so that any verifier can re-derive them independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::{canonicalize, sha256_hex};
use crate::error::CoreError;

/// The current receipt schema version.
pub const RECEIPT_VERSION: &str = "1.0";

/// Sentinel `previous_hash` for the first receipt in a chain.
pub const GENESIS_HASH: &str = "GENESIS";

/// Check that a string has the shape of a receipt identifier:
/// a 64-character lowercase hex SHA-256 digest.
///
/// External identifier lookups must pass this before touching storage.
pub fn is_receipt_id(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// The interaction payload: model/provider plus content hashes.
///
/// Raw `prompt`/`response` text is present only when privacy-preserving
/// mode is explicitly disabled; the hashes are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub model: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub prompt_hash: String,
    pub response_hash: String,
}

/// Link to the prior receipt in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    /// Hash of the previous receipt's chain link, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// Link-commitment hash over this receipt plus `previous_hash`.
    pub chain_hash: String,
    /// 1-based position in the chain, strictly increasing by 1.
    pub chain_length: u64,
}

/// Proof of authorship over the complete receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSignature {
    pub algorithm: String,
    /// Ed25519 signature, 128-character hex.
    pub value: String,
    pub key_version: String,
    pub timestamp_signed: String,
}

impl ReceiptSignature {
    /// An unsigned placeholder, used only while a receipt is being built.
    pub fn empty() -> Self {
        Self {
            algorithm: String::new(),
            value: String::new(),
            key_version: String::new(),
            timestamp_signed: String::new(),
        }
    }
}

/// One signed, hash-chained audit record of an AI interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustReceipt {
    /// Content-derived identity: SHA-256 over the identity payload.
    pub id: String,
    pub version: String,
    /// Creation instant, RFC 3339. Set once, never mutated.
    pub timestamp: String,
    pub session_id: String,
    pub agent_did: String,
    pub human_did: String,
    pub policy_version: String,
    pub mode: String,
    pub interaction: Interaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub chain: ChainLink,
    pub signature: ReceiptSignature,
}

impl TrustReceipt {
    fn to_value(&self) -> Result<Value, CoreError> {
        serde_json::to_value(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// The payload `id` is derived from: receipt minus `id`, minus
    /// `signature`, with `chain.chain_hash` masked to `""`.
    pub fn identity_payload(&self) -> Result<Value, CoreError> {
        let mut value = self.to_value()?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CoreError::Encoding("receipt is not an object".into()))?;
        obj.remove("id");
        obj.remove("signature");
        mask_chain_hash(obj)?;
        Ok(value)
    }

    /// The payload `chain_hash` commits to: receipt minus `signature`, with
    /// `chain.chain_hash` masked to `""`. Unlike the identity payload this
    /// includes the real `id`.
    pub fn linkage_payload(&self) -> Result<Value, CoreError> {
        let mut value = self.to_value()?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CoreError::Encoding("receipt is not an object".into()))?;
        obj.remove("signature");
        mask_chain_hash(obj)?;
        Ok(value)
    }

    /// The payload the signature covers: the complete receipt (real `id`,
    /// real `chain_hash`) minus the `signature` field itself.
    pub fn signing_payload(&self) -> Result<Value, CoreError> {
        let mut value = self.to_value()?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CoreError::Encoding("receipt is not an object".into()))?;
        obj.remove("signature");
        Ok(value)
    }

    /// Recompute the content identity from scratch.
    pub fn compute_id(&self) -> Result<String, CoreError> {
        let payload = self.identity_payload()?;
        Ok(sha256_hex(canonicalize(&payload).as_bytes()))
    }

    /// Recompute the chain hash: SHA-256 over the canonical linkage payload
    /// concatenated with `previous_hash`.
    pub fn compute_chain_hash(&self) -> Result<String, CoreError> {
        let payload = self.linkage_payload()?;
        let mut bytes = canonicalize(&payload).into_bytes();
        bytes.extend_from_slice(self.chain.previous_hash.as_bytes());
        Ok(sha256_hex(&bytes))
    }

    /// The exact bytes the signature is computed over.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let payload = self.signing_payload()?;
        Ok(canonicalize(&payload).into_bytes())
    }

    /// Stub or unsigned receipts must never reach durable storage.
    pub fn is_placeholder(&self) -> bool {
        self.id == GENESIS_HASH || self.id.is_empty() || self.signature.value.is_empty()
    }
}

/// Hash raw interaction text (prompt or response) to its 64-hex digest.
pub fn hash_content(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

fn mask_chain_hash(obj: &mut serde_json::Map<String, Value>) -> Result<(), CoreError> {
    let chain = obj
        .get_mut("chain")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| CoreError::Encoding("receipt chain is not an object".into()))?;
    chain.insert("chain_hash".into(), Value::String(String::new()));
    Ok(())
}
