// SPDX-License-Identifier: MIT

//! The replication engine.
//!
//! One [`SyncEngine::run_pass`] call replicates every pending record,
//! model by model in registry order. The engine holds its dependencies
//! explicitly (store, push client, connectivity) and keeps no other
//! state; concurrency control lives in the scheduler.

use chrono::Utc;
use std::sync::Arc;

use till_core::{Model, RecordStore};

use crate::client::PushClient;
use crate::connectivity::Connectivity;
use crate::error::{Error, Result};
use crate::summary::{SyncResult, SyncSummary};

/// Replicates unsynced records from the local store to the remote.
pub struct SyncEngine<S, P> {
    store: Arc<S>,
    client: P,
    connectivity: Connectivity,
}

impl<S: RecordStore, P: PushClient> SyncEngine<S, P> {
    /// Construct an engine from its collaborators.
    pub fn new(store: Arc<S>, client: P, connectivity: Connectivity) -> Self {
        SyncEngine {
            store,
            client,
            connectivity,
        }
    }

    /// The local store this engine reads from and marks.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The connectivity signal gating this engine's passes.
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Run one full replication pass across all models.
    ///
    /// Fails only for the offline precondition; per-record and
    /// per-model failures are captured inside the returned summary.
    /// One model's total failure never blocks the models after it.
    pub async fn run_pass(&self) -> Result<SyncSummary> {
        if !self.connectivity.is_online() {
            return Err(Error::Offline);
        }

        tracing::debug!("starting replication pass");
        let mut results = Vec::with_capacity(Model::ALL.len());
        for model in Model::ALL {
            let result = self.sync_model(model).await;
            if !result.errors.is_empty() {
                tracing::warn!(
                    model = %model,
                    errors = result.errors.len(),
                    "model failed to sync; its records stay queued for the next pass"
                );
            }
            results.push(result);
        }

        let summary = SyncSummary::from_results(results);
        tracing::info!(
            total_synced = summary.total_synced,
            total_errors = summary.total_errors,
            "replication pass completed"
        );
        Ok(summary)
    }

    /// Sync one model: snapshot its unsynced set, push each record
    /// sequentially, then commit the sync flag all-or-nothing.
    ///
    /// Records created while the pass runs are not in the snapshot and
    /// will be picked up by the next pass.
    async fn sync_model(&self, model: Model) -> SyncResult {
        let records = match self.store.find_unsynced(model) {
            Ok(records) => records,
            Err(e) => {
                return SyncResult::failure(
                    model,
                    vec![format!("failed to read unsynced {} records: {}", model, e)],
                );
            }
        };

        if records.is_empty() {
            return SyncResult::success(model, 0);
        }

        tracing::debug!(model = %model, pending = records.len(), "pushing unsynced records");
        let mut errors = Vec::new();
        for record in &records {
            if let Err(e) = self.client.push(record).await {
                errors.push(format!(
                    "failed to push {} record {}: {}",
                    model, record.id, e
                ));
            }
        }

        if !errors.is_empty() {
            // All-or-nothing commit per model per pass: even records
            // that pushed fine stay unsynced, and the next pass
            // re-pushes the whole set. The remote upsert is idempotent
            // by id, so the re-push is safe.
            return SyncResult::failure(model, errors);
        }

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        match self.store.mark_synced(model, &ids, Utc::now()) {
            Ok(()) => SyncResult::success(model, ids.len()),
            Err(e) => SyncResult::failure(
                model,
                vec![format!("failed to mark {} records synced: {}", model, e)],
            ),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
