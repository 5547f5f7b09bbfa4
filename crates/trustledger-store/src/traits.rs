//! Store trait: the narrow persistence interface the ledger depends on.
//!
//! The generator writes through this trait (best effort) and reloads the
//! chain tip from it on restart; the exporter reads collections through it.
//! The trait keeps the ledger storage-agnostic: SQLite is the durable
//! backend, the in-memory store backs tests.

use async_trait::async_trait;

use trustledger_core::{is_receipt_id, TrustReceipt};

use crate::error::{Result, StoreError};

/// Result of persisting a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    /// Receipt was stored.
    Created,
    /// A receipt with the same id already exists (idempotent, not an error).
    AlreadyExists,
    /// Stub or unsigned placeholder, filtered at the persistence boundary.
    Rejected,
}

/// Query keys the bridge supports. All fields are optional and AND-combined.
///
/// Keyed by content id, session, chain linkage, and timestamp range —
/// enough to reconstruct the chain tip after a restart.
#[derive(Debug, Clone, Default)]
pub struct ReceiptQuery {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub agent_did: Option<String>,
    pub previous_hash: Option<String>,
    pub chain_hash: Option<String>,
    /// Inclusive lower bound, RFC 3339 UTC.
    pub since: Option<String>,
    /// Inclusive upper bound, RFC 3339 UTC.
    pub until: Option<String>,
}

impl ReceiptQuery {
    /// Query by content identity.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Query by session.
    pub fn by_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Validate identifier shapes before they reach storage.
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id {
            if !is_receipt_id(id) {
                return Err(StoreError::InvalidId(id.clone()));
            }
        }
        Ok(())
    }

    /// Check a receipt against every set key.
    ///
    /// Timestamps are fixed-format UTC strings, so the range bounds compare
    /// lexicographically.
    pub fn matches(&self, receipt: &TrustReceipt) -> bool {
        if let Some(id) = &self.id {
            if &receipt.id != id {
                return false;
            }
        }
        if let Some(session_id) = &self.session_id {
            if &receipt.session_id != session_id {
                return false;
            }
        }
        if let Some(agent_did) = &self.agent_did {
            if &receipt.agent_did != agent_did {
                return false;
            }
        }
        if let Some(previous_hash) = &self.previous_hash {
            if &receipt.chain.previous_hash != previous_hash {
                return false;
            }
        }
        if let Some(chain_hash) = &self.chain_hash {
            if &receipt.chain.chain_hash != chain_hash {
                return false;
            }
        }
        if let Some(since) = &self.since {
            if receipt.timestamp.as_str() < since.as_str() {
                return false;
            }
        }
        if let Some(until) = &self.until {
            if receipt.timestamp.as_str() > until.as_str() {
                return false;
            }
        }
        true
    }
}

/// The persistence bridge: create / find / count plus chain-tip recovery.
///
/// # Design Notes
///
/// - **Idempotent creates**: storing the same receipt twice returns
///   `AlreadyExists`.
/// - **Placeholder filtering**: stub/unsigned receipts are `Rejected`,
///   never stored.
/// - **Tip recovery**: `latest` returns the highest-chain-length receipt so
///   a restarted generator continues the chain instead of silently starting
///   a disconnected one.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Persist a receipt.
    async fn create(&self, receipt: &TrustReceipt) -> Result<CreateResult>;

    /// Find receipts matching a query, ordered by chain length.
    async fn find(&self, query: &ReceiptQuery) -> Result<Vec<TrustReceipt>>;

    /// Count receipts matching a query.
    async fn count(&self, query: &ReceiptQuery) -> Result<u64>;

    /// The receipt with the highest chain length, if any.
    async fn latest(&self) -> Result<Option<TrustReceipt>>;
}
