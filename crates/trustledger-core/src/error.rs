//! Error types for the trust ledger core.

use thiserror::Error;

/// Core errors that can occur during receipt operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Schema validation errors: the receipt is structurally unsound.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported receipt version: {0:?}")]
    UnsupportedVersion(String),

    #[error("field {0} is empty")]
    EmptyField(&'static str),

    #[error("field {field} is not a 64-character lowercase hex digest: {value:?}")]
    MalformedDigest { field: &'static str, value: String },

    #[error("timestamp {field} is not RFC 3339: {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },

    #[error("chain_length must be >= 1, got {0}")]
    InvalidChainLength(u64),

    #[error("unsupported signature algorithm: {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("signature value is not a 128-character hex string")]
    MalformedSignature,
}
