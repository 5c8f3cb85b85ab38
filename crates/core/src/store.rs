// SPDX-License-Identifier: MIT

//! SQLite-backed record store.
//!
//! The [`RecordStore`] trait is the narrow adapter surface the
//! replication engine and status reporter consume: select unsynced
//! records, flip the sync flag, count. [`SqliteStore`] is the
//! production implementation; tests may substitute their own.
//!
//! All local writes go through [`SqliteStore::put`], which always
//! resets the sync flag. That is the contract between the application
//! write path and the engine: a write never blocks on the network, it
//! just queues the record (via `synced = 0`) for the next pass.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::model::Model;
use crate::record::Record;

/// SQL schema for the local record store.
pub const SCHEMA: &str = r#"
-- One row per replicated entity. Domain fields are an opaque JSON
-- payload; the replication engine only reads id, synced, synced_at.
CREATE TABLE IF NOT EXISTS records (
    model TEXT NOT NULL,
    id TEXT NOT NULL,
    payload TEXT NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    synced_at TEXT,
    PRIMARY KEY (model, id)
);

CREATE INDEX IF NOT EXISTS idx_records_unsynced ON records(model, synced);
"#;

/// Narrow store interface consumed by the replication engine.
pub trait RecordStore: Send + Sync {
    /// Total number of records for a model.
    fn count(&self, model: Model) -> Result<u64>;

    /// Number of records for a model still waiting to be pushed.
    fn count_unsynced(&self, model: Model) -> Result<u64>;

    /// All unsynced records for a model, in natural insertion order.
    fn find_unsynced(&self, model: Model) -> Result<Vec<Record>>;

    /// Bulk-mark the given ids as synced with the given timestamp.
    fn mark_synced(&self, model: Model, ids: &[String], at: DateTime<Utc>) -> Result<()>;

    /// Administrative reset: mark every record of a model unsynced.
    fn mark_all_unsynced(&self, model: Model) -> Result<()>;
}

/// Production record store backed by SQLite.
///
/// The connection is wrapped in a mutex so a single store can be shared
/// by the engine and the status reporter across tasks.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (used by tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or update a record. The sync flag is always reset: any
    /// local mutation makes the record eligible for the next pass.
    pub fn put(&self, model: Model, id: &str, payload: &Value) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO records (model, id, payload, synced, synced_at)
             VALUES (?1, ?2, ?3, 0, NULL)
             ON CONFLICT (model, id) DO UPDATE
             SET payload = excluded.payload, synced = 0, synced_at = NULL",
            params![model.as_str(), id, payload.to_string()],
        )?;
        Ok(())
    }

    /// Fetch a single record.
    pub fn get(&self, model: Model, id: &str) -> Result<Record> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT payload, synced, synced_at FROM records WHERE model = ?1 AND id = ?2",
                params![model.as_str(), id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Error::RecordNotFound {
                    model: model.to_string(),
                    id: id.to_string(),
                },
                other => Error::Database(other),
            })?;
        row_to_record(model, id.to_string(), row)
    }
}

fn row_to_record(model: Model, id: String, row: (String, bool, Option<String>)) -> Result<Record> {
    let (payload, synced, synced_at) = row;
    let payload: Value = serde_json::from_str(&payload)
        .map_err(|e| Error::CorruptedData(format!("record {} {}: {}", model, id, e)))?;
    let synced_at = synced_at
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::CorruptedData(format!("record {} {}: {}", model, id, e)))
        })
        .transpose()?;
    Ok(Record {
        id,
        model,
        payload,
        synced,
        synced_at,
    })
}

impl RecordStore for SqliteStore {
    fn count(&self, model: Model) -> Result<u64> {
        let conn = self.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE model = ?1",
            params![model.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    fn count_unsynced(&self, model: Model) -> Result<u64> {
        let conn = self.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE model = ?1 AND synced = 0",
            params![model.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    fn find_unsynced(&self, model: Model) -> Result<Vec<Record>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, payload, synced, synced_at FROM records
             WHERE model = ?1 AND synced = 0 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![model.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, payload, synced, synced_at) = row?;
            records.push(row_to_record(model, id, (payload, synced, synced_at))?);
        }
        Ok(records)
    }

    fn mark_synced(&self, model: Model, ids: &[String], at: DateTime<Utc>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = self.lock();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE records SET synced = 1, synced_at = ?
             WHERE model = ? AND id IN ({})",
            placeholders
        );
        let mut params: Vec<String> = Vec::with_capacity(ids.len() + 2);
        params.push(at.to_rfc3339());
        params.push(model.as_str().to_string());
        params.extend(ids.iter().cloned());
        conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    fn mark_all_unsynced(&self, model: Model) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE records SET synced = 0, synced_at = NULL WHERE model = ?1",
            params![model.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
