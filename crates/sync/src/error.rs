// SPDX-License-Identifier: MIT

//! Error types for till-sync operations.

use thiserror::Error;

/// All possible errors that can occur in till-sync operations.
///
/// Per-record and per-model push failures are deliberately *not*
/// errors: the engine captures them as strings inside the pass summary
/// so one bad record never aborts a pass.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot sync while offline")]
    Offline,

    #[error("sync already in progress")]
    AlreadySyncing,

    #[error("sync scheduler is not running")]
    SchedulerStopped,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for till-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
