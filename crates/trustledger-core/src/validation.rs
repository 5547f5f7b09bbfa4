//! Schema validation: structural and type conformance of a receipt.
//!
//! Schema validation is the gating check. Identity, signature, and chain
//! checks are meaningless over a receipt that is not well-typed, so the
//! validator runs this first and the generator runs it last (a freshly
//! generated receipt that fails its own schema is an invariant violation,
//! not a caller error).

use chrono::DateTime;

use crate::crypto::SIGNATURE_ALGORITHM;
use crate::error::ValidationError;
use crate::receipt::{is_receipt_id, TrustReceipt, GENESIS_HASH, RECEIPT_VERSION};

/// Validate a receipt's structure. Does not touch identity, signature, or
/// chain linkage.
pub fn validate_schema(receipt: &TrustReceipt) -> Result<(), ValidationError> {
    if receipt.version != RECEIPT_VERSION {
        return Err(ValidationError::UnsupportedVersion(receipt.version.clone()));
    }

    check_timestamp("timestamp", &receipt.timestamp)?;
    check_non_empty("session_id", &receipt.session_id)?;
    check_non_empty("agent_did", &receipt.agent_did)?;
    check_non_empty("human_did", &receipt.human_did)?;
    check_non_empty("policy_version", &receipt.policy_version)?;
    check_non_empty("mode", &receipt.mode)?;

    check_digest("id", &receipt.id)?;
    check_non_empty("interaction.model", &receipt.interaction.model)?;
    check_non_empty("interaction.provider", &receipt.interaction.provider)?;
    check_digest("interaction.prompt_hash", &receipt.interaction.prompt_hash)?;
    check_digest("interaction.response_hash", &receipt.interaction.response_hash)?;

    // previous_hash is either the genesis sentinel or a digest
    if receipt.chain.previous_hash != GENESIS_HASH {
        check_digest("chain.previous_hash", &receipt.chain.previous_hash)?;
    }
    check_digest("chain.chain_hash", &receipt.chain.chain_hash)?;
    if receipt.chain.chain_length < 1 {
        return Err(ValidationError::InvalidChainLength(receipt.chain.chain_length));
    }

    if receipt.signature.algorithm != SIGNATURE_ALGORITHM {
        return Err(ValidationError::UnsupportedAlgorithm(
            receipt.signature.algorithm.clone(),
        ));
    }
    // Lowercase hex only, same rule as every digest field.
    let sig = &receipt.signature.value;
    if sig.len() != 128 || !sig.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(ValidationError::MalformedSignature);
    }
    check_non_empty("signature.key_version", &receipt.signature.key_version)?;
    check_timestamp("signature.timestamp_signed", &receipt.signature.timestamp_signed)?;

    Ok(())
}

fn check_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn check_digest(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !is_receipt_id(value) {
        return Err(ValidationError::MalformedDigest {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_timestamp(field: &'static str, value: &str) -> Result<(), ValidationError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| ValidationError::MalformedTimestamp {
        field,
        value: value.to_string(),
    })?;
    Ok(())
}
