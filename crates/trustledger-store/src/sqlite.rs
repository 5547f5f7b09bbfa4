//! SQLite implementation of the store trait.
//!
//! The durable backend for the ledger. Uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking so receipt writes never block
//! the runtime.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use trustledger_core::TrustReceipt;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{CreateResult, ReceiptQuery, ReceiptStore};

/// SQLite-based store implementation.
///
/// Thread-safe via an internal mutex around the single connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path, running migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn lock_conn(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Task(format!("mutex poisoned: {}", e)))
}

fn decode_body(body: &str) -> Result<TrustReceipt> {
    serde_json::from_str(body).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Build the WHERE clause and its (all-TEXT) parameters for a query.
fn build_where(query: &ReceiptQuery) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(id) = &query.id {
        clauses.push("id = ?");
        params.push(id.clone());
    }
    if let Some(session_id) = &query.session_id {
        clauses.push("session_id = ?");
        params.push(session_id.clone());
    }
    if let Some(agent_did) = &query.agent_did {
        clauses.push("agent_did = ?");
        params.push(agent_did.clone());
    }
    if let Some(previous_hash) = &query.previous_hash {
        clauses.push("previous_hash = ?");
        params.push(previous_hash.clone());
    }
    if let Some(chain_hash) = &query.chain_hash {
        clauses.push("chain_hash = ?");
        params.push(chain_hash.clone());
    }
    if let Some(since) = &query.since {
        clauses.push("timestamp >= ?");
        params.push(since.clone());
    }
    if let Some(until) = &query.until {
        clauses.push("timestamp <= ?");
        params.push(until.clone());
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

#[async_trait]
impl ReceiptStore for SqliteStore {
    async fn create(&self, receipt: &TrustReceipt) -> Result<CreateResult> {
        if receipt.is_placeholder() {
            return Ok(CreateResult::Rejected);
        }

        let receipt = receipt.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM receipts WHERE id = ?1",
                    params![receipt.id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(CreateResult::AlreadyExists);
            }

            let body = serde_json::to_string(&receipt)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            conn.execute(
                "INSERT INTO receipts (
                    id, session_id, agent_did, previous_hash, chain_hash,
                    chain_length, timestamp, body
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    receipt.id,
                    receipt.session_id,
                    receipt.agent_did,
                    receipt.chain.previous_hash,
                    receipt.chain.chain_hash,
                    receipt.chain.chain_length as i64,
                    receipt.timestamp,
                    body,
                ],
            )?;

            Ok(CreateResult::Created)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn find(&self, query: &ReceiptQuery) -> Result<Vec<TrustReceipt>> {
        query.validate()?;
        let query = query.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;

            let (where_clause, params) = build_where(&query);
            let sql = format!(
                "SELECT body FROM receipts{} ORDER BY chain_length",
                where_clause
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                row.get::<_, String>(0)
            })?;

            let mut receipts = Vec::new();
            for body in rows {
                receipts.push(decode_body(&body?)?);
            }
            Ok(receipts)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn count(&self, query: &ReceiptQuery) -> Result<u64> {
        query.validate()?;
        let query = query.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;

            let (where_clause, params) = build_where(&query);
            let sql = format!("SELECT COUNT(*) FROM receipts{}", where_clause);

            let count: i64 = conn.query_row(
                &sql,
                rusqlite::params_from_iter(params.iter()),
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn latest(&self) -> Result<Option<TrustReceipt>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;

            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM receipts ORDER BY chain_length DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            body.as_deref().map(decode_body).transpose()
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
