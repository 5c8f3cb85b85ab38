// SPDX-License-Identifier: MIT

//! till-sync: replication engine for the till point-of-sale system.
//!
//! Keeps the local (offline-capable) record store eventually consistent
//! with the remote authoritative store, without ever blocking the
//! application's write path. Local writes just leave records unsynced;
//! the scheduler decides when a replication pass runs and the engine
//! pushes every pending record, model by model, in registry order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   watch    ┌─────────────┐   spawn    ┌────────────┐
//! │ Connectivity │───────────►│  Scheduler  │───────────►│ SyncEngine │
//! │   monitor    │            │ (one loop,  │            │ (one pass) │
//! └──────────────┘            │single-flight│            └─────┬──────┘
//!         ▲                   └──────▲──────┘                  │
//!         │                          │ trigger            ┌────┴─────┐
//!    host network               ┌────┴─────┐              ▼          ▼
//!      probe                    │SyncHandle│        ┌───────────┐ ┌──────────┐
//!                               │(observer)│        │RecordStore│ │PushClient│
//!                               └──────────┘        │  (local)  │ │ (remote) │
//!                                                   └───────────┘ └──────────┘
//! ```
//!
//! # Features
//!
//! - Per-model, per-record push to the remote upsert endpoint
//! - All-or-nothing sync-flag commit per model per pass
//! - Debounced sync on reconnect, periodic sync while online,
//!   manual trigger; at most one pass in flight
//! - Injectable push client trait for testing

pub mod client;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod status;
pub mod summary;

pub use client::{HttpPushClient, PushClient, PushError};
pub use config::SyncConfig;
pub use connectivity::Connectivity;
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use scheduler::{Scheduler, SchedulerState, SyncHandle};
pub use status::{ModelCounts, StatusReporter};
pub use summary::{SyncResult, SyncSummary};

#[cfg(test)]
mod test_helpers;
