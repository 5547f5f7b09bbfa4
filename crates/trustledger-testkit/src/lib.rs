//! # Trustledger Testkit
//!
//! Testing utilities for the trust receipt ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known canonicalization cases with expected digests
//!   for cross-implementation verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use trustledger_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use trustledger_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([1; 32]);
//! let generator = fixture.generator();
//! let record = fixture.record("my-session");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_signer_fixtures, TestFixture};
pub use generators::{interaction_record, keypair, session_id};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
