// SPDX-License-Identifier: MIT

//! Shared test doubles for till-sync tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

use till_core::{Error as CoreError, Model, Record, RecordStore, Result as CoreResult};

use crate::client::{PushClient, PushError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory record store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    fail_reads: Mutex<HashSet<Model>>,
    fail_marks: Mutex<HashSet<Model>>,
    fail_counts: Mutex<HashSet<Model>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Create or update a record; always resets the sync flag, like
    /// the production store.
    pub fn put(&self, model: Model, id: &str, payload: Value) {
        let mut records = lock(&self.records);
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.model == model && r.id == id)
        {
            existing.payload = payload;
            existing.synced = false;
            existing.synced_at = None;
        } else {
            records.push(Record::new(model, id, payload));
        }
    }

    pub fn get(&self, model: Model, id: &str) -> Option<Record> {
        lock(&self.records)
            .iter()
            .find(|r| r.model == model && r.id == id)
            .cloned()
    }

    /// Make `find_unsynced` fail for a model.
    pub fn fail_reads_for(&self, model: Model) {
        lock(&self.fail_reads).insert(model);
    }

    /// Make `mark_synced` fail for a model.
    pub fn fail_marks_for(&self, model: Model) {
        lock(&self.fail_marks).insert(model);
    }

    /// Make the count methods fail for a model.
    pub fn fail_counts_for(&self, model: Model) {
        lock(&self.fail_counts).insert(model);
    }
}

impl RecordStore for MemoryStore {
    fn count(&self, model: Model) -> CoreResult<u64> {
        if lock(&self.fail_counts).contains(&model) {
            return Err(CoreError::CorruptedData(format!(
                "injected {} count failure",
                model
            )));
        }
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.model == model)
            .count() as u64)
    }

    fn count_unsynced(&self, model: Model) -> CoreResult<u64> {
        if lock(&self.fail_counts).contains(&model) {
            return Err(CoreError::CorruptedData(format!(
                "injected {} count failure",
                model
            )));
        }
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.model == model && !r.synced)
            .count() as u64)
    }

    fn find_unsynced(&self, model: Model) -> CoreResult<Vec<Record>> {
        if lock(&self.fail_reads).contains(&model) {
            return Err(CoreError::CorruptedData(format!(
                "injected {} read failure",
                model
            )));
        }
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.model == model && !r.synced)
            .cloned()
            .collect())
    }

    fn mark_synced(&self, model: Model, ids: &[String], at: DateTime<Utc>) -> CoreResult<()> {
        if lock(&self.fail_marks).contains(&model) {
            return Err(CoreError::CorruptedData(format!(
                "injected {} mark failure",
                model
            )));
        }
        let mut records = lock(&self.records);
        for record in records.iter_mut() {
            if record.model == model && ids.contains(&record.id) {
                record.synced = true;
                record.synced_at = Some(at);
            }
        }
        Ok(())
    }

    fn mark_all_unsynced(&self, model: Model) -> CoreResult<()> {
        let mut records = lock(&self.records);
        for record in records.iter_mut() {
            if record.model == model {
                record.synced = false;
                record.synced_at = None;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MockInner {
    calls: Mutex<Vec<(Model, String)>>,
    fail_ids: Mutex<HashSet<(Model, String)>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Scripted push client. Clones share state, so tests can keep one
/// clone and hand the other to the engine.
#[derive(Clone, Default)]
pub struct MockPushClient {
    inner: Arc<MockInner>,
}

impl MockPushClient {
    pub fn new() -> Self {
        MockPushClient::default()
    }

    /// Hold every push until permits are added to the gate.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        let client = MockPushClient::new();
        *lock(&client.inner.gate) = Some(gate);
        client
    }

    /// Reject pushes for this record from now on.
    pub fn fail(&self, model: Model, id: &str) {
        lock(&self.inner.fail_ids).insert((model, id.to_string()));
    }

    /// Accept pushes for this record again.
    pub fn pass(&self, model: Model, id: &str) {
        lock(&self.inner.fail_ids).remove(&(model, id.to_string()));
    }

    /// Every push attempted so far, in order.
    pub fn calls(&self) -> Vec<(Model, String)> {
        lock(&self.inner.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.inner.calls).len()
    }
}

#[async_trait]
impl PushClient for MockPushClient {
    async fn push(&self, record: &Record) -> Result<(), PushError> {
        let gate = lock(&self.inner.gate).clone();
        if let Some(gate) = gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(PushError::Network("gate closed".to_string())),
            }
        }
        lock(&self.inner.calls).push((record.model, record.id.clone()));
        if lock(&self.inner.fail_ids).contains(&(record.model, record.id.clone())) {
            return Err(PushError::Rejected {
                status: 422,
                body: format!("record {} rejected", record.id),
            });
        }
        Ok(())
    }
}
