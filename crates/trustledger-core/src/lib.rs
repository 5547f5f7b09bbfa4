//! # Trustledger Core
//!
//! Pure primitives for the trust receipt ledger: canonical serialization,
//! content identity, Ed25519 signing types, and the receipt data model.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures, shared byte-for-byte by
//! the generating and verifying sides.
//!
//! ## Key Types
//!
//! - [`TrustReceipt`] - One signed, hash-chained audit record
//! - [`SigningKeypair`] / [`PublicKey`] - Ed25519 wrapper types
//! - [`canonical::canonicalize`] - deep, key-sorted canonical JSON
//!
//! ## Canonicalization
//!
//! Identity, chain hash, and signature are all computed over the canonical
//! JSON form. See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod receipt;
pub mod validation;

pub use canonical::{canonical_hash, canonical_json, canonicalize, sha256_hex};
pub use crypto::{
    PublicKey, Sha256Digest, SignatureBytes, SigningKeypair, SIGNATURE_ALGORITHM,
};
pub use error::{CoreError, ValidationError};
pub use receipt::{
    hash_content, is_receipt_id, ChainLink, Interaction, ReceiptSignature, TrustReceipt,
    GENESIS_HASH, RECEIPT_VERSION,
};
pub use validation::validate_schema;
