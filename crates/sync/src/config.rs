// SPDX-License-Identifier: MIT

//! Replication configuration.
//!
//! All options have sensible defaults; the host application typically
//! loads them from its config file and may swap them at runtime via
//! [`SyncHandle::update_config`](crate::SyncHandle::update_config)
//! without restarting the process.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for the replication engine and its scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Run automatic passes (debounced reconnect + periodic timer).
    /// Manual triggers work regardless.
    #[serde(default = "default_enable_auto_sync")]
    pub enable_auto_sync: bool,
    /// Periodic pass interval while online, in milliseconds.
    /// 0 disables the periodic timer.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
    /// Delay after reconnect before the first pass, in milliseconds,
    /// to absorb a flapping link.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Base URL of the remote sync API (e.g. `https://pos.example.com`).
    #[serde(default)]
    pub remote_base_url: String,
    /// Bearer credential for the remote sync API.
    #[serde(default)]
    pub api_key: String,
    /// Per-push request timeout in milliseconds. Must stay finite: a
    /// hung push would otherwise stall single-flight indefinitely.
    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,
}

fn default_enable_auto_sync() -> bool {
    true
}

fn default_sync_interval_ms() -> u64 {
    30_000
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_push_timeout_ms() -> u64 {
    10_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            enable_auto_sync: default_enable_auto_sync(),
            sync_interval_ms: default_sync_interval_ms(),
            debounce_ms: default_debounce_ms(),
            remote_base_url: String::new(),
            api_key: String::new(),
            push_timeout_ms: default_push_timeout_ms(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("invalid sync config: {}", e)))
    }

    /// Debounce delay after reconnect.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Periodic pass interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    /// Per-push request timeout.
    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }

    /// Whether the periodic timer is active.
    pub fn periodic_enabled(&self) -> bool {
        self.enable_auto_sync && self.sync_interval_ms > 0
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
