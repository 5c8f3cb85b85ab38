// SPDX-License-Identifier: MIT

//! Replicated records and the sync flag.
//!
//! A [`Record`] is any persisted entity belonging to one of the
//! [`Model`] kinds. The replication engine only cares about three of
//! its attributes: `id`, the `synced` flag, and `synced_at`. Domain
//! fields live in an opaque JSON payload owned by the POS application.
//!
//! Invariant: `synced == true` exactly when `synced_at` is set. A
//! record is born unsynced on every local create or update; it becomes
//! synced only when the replication engine confirms the remote
//! accepted it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Model;

/// Bookkeeping keys stripped from payloads before transmission.
const SYNC_KEYS: [&str; 3] = ["synced", "syncedAt", "synced_at"];

/// A locally persisted entity tracked by the replication engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique id within the record's model.
    pub id: String,
    /// The model kind this record belongs to.
    pub model: Model,
    /// Domain fields, opaque to the replication engine.
    pub payload: Value,
    /// Whether the record has reached the remote store.
    pub synced: bool,
    /// When the remote accepted the record, if it has.
    pub synced_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a new record, born unsynced.
    pub fn new(model: Model, id: impl Into<String>, payload: Value) -> Self {
        Record {
            id: id.into(),
            model,
            payload,
            synced: false,
            synced_at: None,
        }
    }

    /// Check the sync flag invariant: `synced` and `synced_at` must
    /// agree.
    pub fn sync_flag_consistent(&self) -> bool {
        self.synced == self.synced_at.is_some()
    }

    /// Build the JSON body sent to the remote upsert endpoint.
    ///
    /// The payload is transmitted with `id` inserted and any sync
    /// bookkeeping keys stripped. Non-object payloads are wrapped so
    /// the id is always present on the wire.
    pub fn wire_body(&self) -> Value {
        let mut body = match &self.payload {
            Value::Object(map) => {
                let mut map = map.clone();
                for key in SYNC_KEYS {
                    map.remove(key);
                }
                map
            }
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
        };
        body.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(body)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
