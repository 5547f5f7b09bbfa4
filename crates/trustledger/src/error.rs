//! Error types for the ledger facade.

use thiserror::Error;
use trustledger_core::{CoreError, ValidationError};
use trustledger_store::StoreError;

/// Errors that can occur during ledger operations.
///
/// Verification failures are deliberately NOT here: they are structured
/// results (see [`crate::validator::VerificationReport`]), never errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Missing or malformed signing key. Fatal; no receipt is emitted.
    #[error("configuration error: {0}")]
    Config(String),

    /// A freshly generated receipt failed its own schema. This is a bug in
    /// the generator, not a caller error.
    #[error("generated receipt failed schema validation: {0}")]
    Invariant(ValidationError),

    /// Core error (canonicalization, crypto).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Unknown export format name.
    #[error("unsupported export format: {0:?}")]
    UnsupportedFormat(String),

    /// Export rendering failed.
    #[error("export render error: {0}")]
    Render(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
