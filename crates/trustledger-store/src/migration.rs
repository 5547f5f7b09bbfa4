//! Database schema migrations for SQLite.
//!
//! Simple versioned migrations: each migration transforms the schema from
//! version N to N+1 inside one transaction.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
                rusqlite::params![version],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Serialization(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// v1: the receipts table, keyed by content id with chain/session/timestamp
/// columns for lookup and the full receipt JSON alongside.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE receipts (
            id            TEXT PRIMARY KEY,
            session_id    TEXT NOT NULL,
            agent_did     TEXT NOT NULL,
            previous_hash TEXT NOT NULL,
            chain_hash    TEXT NOT NULL,
            chain_length  INTEGER NOT NULL,
            timestamp     TEXT NOT NULL,
            body          TEXT NOT NULL
        );
        CREATE INDEX idx_receipts_session ON receipts(session_id);
        CREATE INDEX idx_receipts_agent ON receipts(agent_did);
        CREATE INDEX idx_receipts_chain_hash ON receipts(chain_hash);
        CREATE INDEX idx_receipts_previous_hash ON receipts(previous_hash);
        CREATE INDEX idx_receipts_chain_length ON receipts(chain_length);
        CREATE INDEX idx_receipts_timestamp ON receipts(timestamp);",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrate_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, CURRENT_VERSION);
    }
}
