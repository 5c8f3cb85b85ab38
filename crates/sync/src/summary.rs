// SPDX-License-Identifier: MIT

//! Outcome types for a replication pass.
//!
//! A [`SyncSummary`] is created fresh per pass and never mutated after
//! it is returned; the status surface and UI layer only read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use till_core::Model;

/// Per-model outcome of one replication pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// The model this result describes.
    pub model: Model,
    /// True iff the model produced zero errors this pass.
    pub success: bool,
    /// Records confirmed by the remote *and* marked locally.
    pub synced_count: usize,
    /// One message per failed record, or one model-level message.
    pub errors: Vec<String>,
}

impl SyncResult {
    /// A clean result: everything pushed (possibly nothing to push).
    pub(crate) fn success(model: Model, synced_count: usize) -> Self {
        SyncResult {
            model,
            success: true,
            synced_count,
            errors: Vec::new(),
        }
    }

    /// A failed result: nothing in this model was marked synced.
    pub(crate) fn failure(model: Model, errors: Vec<String>) -> Self {
        SyncResult {
            model,
            success: false,
            synced_count: 0,
            errors,
        }
    }
}

/// Aggregate outcome of one full replication pass across all models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Total records synced across all models.
    pub total_synced: usize,
    /// Total error messages across all models.
    pub total_errors: usize,
    /// Per-model results, always in registry order.
    pub model_results: Vec<SyncResult>,
    /// When the pass finished.
    pub completed_at: DateTime<Utc>,
}

impl SyncSummary {
    pub(crate) fn from_results(model_results: Vec<SyncResult>) -> Self {
        let total_synced = model_results.iter().map(|r| r.synced_count).sum();
        let total_errors = model_results.iter().map(|r| r.errors.len()).sum();
        SyncSummary {
            total_synced,
            total_errors,
            model_results,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
