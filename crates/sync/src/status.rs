// SPDX-License-Identifier: MIT

//! Read-only sync status for observers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use till_core::{Model, RecordStore};

/// Per-model record counts, derived on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCounts {
    /// Total records for the model.
    pub total: u64,
    /// Records still waiting to reach the remote.
    pub unsynced: u64,
}

/// Derives aggregate sync progress by counting through the store.
///
/// Never mutates state and never caches: each call reflects the store
/// at that instant.
pub struct StatusReporter<S> {
    store: Arc<S>,
}

impl<S: RecordStore> StatusReporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        StatusReporter { store }
    }

    /// Counts for every model in the registry.
    ///
    /// A failure counting one model yields zeros for that model and is
    /// logged; it never aborts the rest of the computation. This
    /// mirrors the engine's "one model never blocks others" policy.
    pub fn get_status(&self) -> BTreeMap<Model, ModelCounts> {
        let mut status = BTreeMap::new();
        for model in Model::ALL {
            let counts = match (self.store.count(model), self.store.count_unsynced(model)) {
                (Ok(total), Ok(unsynced)) => ModelCounts { total, unsynced },
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(model = %model, error = %e, "failed to count records");
                    ModelCounts::default()
                }
            };
            status.insert(model, counts);
        }
        status
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
