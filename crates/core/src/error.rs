// SPDX-License-Identifier: MIT

//! Error types for till-core operations.

use thiserror::Error;

/// All possible errors that can occur in till-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown model: '{0}'\n  hint: valid models are: super-admin, user, settings, warehouse, customer, product, sale, sale-item, payment-method")]
    UnknownModel(String),

    #[error("record not found: {model} {id}")]
    RecordNotFound { model: String, id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data in database: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for till-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
