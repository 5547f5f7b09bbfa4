//! In-memory implementation of the store trait.
//!
//! Primarily for tests. Same semantics as SQLite, no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use trustledger_core::TrustReceipt;

use crate::error::Result;
use crate::traits::{CreateResult, ReceiptQuery, ReceiptStore};

/// In-memory store. All data is lost on drop. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Receipts indexed by content id.
    receipts: HashMap<String, TrustReceipt>,
    /// Insertion order, for stable query results.
    order: Vec<String>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn create(&self, receipt: &TrustReceipt) -> Result<CreateResult> {
        if receipt.is_placeholder() {
            return Ok(CreateResult::Rejected);
        }

        let mut inner = self.inner.write().unwrap();
        if inner.receipts.contains_key(&receipt.id) {
            return Ok(CreateResult::AlreadyExists);
        }

        inner.order.push(receipt.id.clone());
        inner.receipts.insert(receipt.id.clone(), receipt.clone());
        Ok(CreateResult::Created)
    }

    async fn find(&self, query: &ReceiptQuery) -> Result<Vec<TrustReceipt>> {
        query.validate()?;
        let inner = self.inner.read().unwrap();

        let mut found: Vec<TrustReceipt> = inner
            .order
            .iter()
            .filter_map(|id| inner.receipts.get(id))
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.chain.chain_length);
        Ok(found)
    }

    async fn count(&self, query: &ReceiptQuery) -> Result<u64> {
        query.validate()?;
        let inner = self.inner.read().unwrap();
        Ok(inner.receipts.values().filter(|r| query.matches(r)).count() as u64)
    }

    async fn latest(&self) -> Result<Option<TrustReceipt>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .receipts
            .values()
            .max_by_key(|r| r.chain.chain_length)
            .cloned())
    }
}
