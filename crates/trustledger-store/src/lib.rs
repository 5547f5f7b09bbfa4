//! # Trustledger Store
//!
//! The persistence bridge for the trust receipt ledger. The ledger only
//! ever needs create / find / count plus chain-tip recovery, so that is the
//! whole trait.
//!
//! ## Key Types
//!
//! - [`ReceiptStore`] - The async trait for receipt persistence
//! - [`SqliteStore`] - SQLite-based durable storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ReceiptQuery`] - AND-combined query keys
//! - [`CreateResult`] - Created / AlreadyExists / Rejected
//!
//! ## Design Notes
//!
//! - **Idempotent creates**: storing the same receipt twice is not an error
//! - **Placeholder filtering**: unsigned or sentinel-id receipts never land
//!   in durable storage
//! - **Tip recovery**: `latest()` carries the chain tip across restarts

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CreateResult, ReceiptQuery, ReceiptStore};
