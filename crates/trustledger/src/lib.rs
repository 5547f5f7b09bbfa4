//! # Trustledger
//!
//! A tamper-evident ledger of AI interaction receipts. Each receipt is a
//! signed, hash-chained record of one agent/human exchange: what ran, under
//! which policy, with what telemetry — canonicalized so that any party can
//! recompute the same hashes from the same content.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           trustledger               │  ← generation, verification, export
//! ├──────────────────┬──────────────────┤
//! │ trustledger-core │ trustledger-store│  ← canonical hashing + persistence
//! └──────────────────┴──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use trustledger::{
//!     GeneratorConfig, InteractionRecord, ReceiptGenerator, verify_receipt,
//! };
//! use trustledger_core::SigningKeypair;
//! use trustledger_store::MemoryStore;
//!
//! # async fn example() -> trustledger::Result<()> {
//! let generator = ReceiptGenerator::new(
//!     SigningKeypair::generate(),
//!     MemoryStore::new(),
//!     GeneratorConfig::default(),
//! );
//!
//! let receipt = generator
//!     .generate(InteractionRecord {
//!         session_id: "session-1".into(),
//!         agent_did: "did:example:agent".into(),
//!         human_did: "did:example:human".into(),
//!         policy_version: "policy-7".into(),
//!         mode: "advisory".into(),
//!         model: "gpt-x".into(),
//!         provider: "openai".into(),
//!         prompt: "hello".into(),
//!         response: "hi".into(),
//!         telemetry: None,
//!         policy_state: None,
//!         metadata: None,
//!     })
//!     .await?;
//!
//! let report = verify_receipt(&receipt, Some(&generator.public_key()), None);
//! assert!(report.valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - **Deterministic identity**: a receipt's `id` is the SHA-256 of its
//!   canonical content, so identical content always hashes identically.
//! - **Tamper evidence**: any post-signing edit breaks the identity check,
//!   the signature check, or both.
//! - **Order evidence**: each receipt commits to its predecessor's chain
//!   hash; reordering or deletion breaks the chain check.
//! - **Independent verification**: [`verify_receipt`] needs only the
//!   receipt and (optionally) a public key — no generator state.

pub mod error;
pub mod export;
pub mod generator;
pub mod validator;

pub use error::{LedgerError, Result};
pub use export::{export_receipts, ExportFilter, ExportFormat, ExportOutput, Pagination};
pub use generator::{ChainState, GeneratorConfig, InteractionRecord, ReceiptGenerator};
pub use validator::{verify_chain, verify_receipt, ChainVerificationReport, VerificationReport};

// Re-export the types callers touch when handling receipts directly.
pub use trustledger_core::{
    PublicKey, SigningKeypair, TrustReceipt, GENESIS_HASH, RECEIPT_VERSION,
};
pub use trustledger_store::{MemoryStore, ReceiptQuery, ReceiptStore, SqliteStore};
