// SPDX-License-Identifier: MIT

//! till-core: Shared library for the till point-of-sale system.
//!
//! This crate provides the replicated data model (models, records, the
//! sync flag) and the local record store used by both the POS
//! application and the till-sync replication engine.

pub mod error;
pub mod model;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use model::Model;
pub use record::Record;
pub use store::{RecordStore, SqliteStore};
