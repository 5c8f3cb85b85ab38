// SPDX-License-Identifier: MIT

//! Network connectivity monitor.
//!
//! A [`Connectivity`] handle carries the boolean online/offline signal
//! between the host's reachability probe (whatever that is: a ping
//! loop, an OS callback, a browser event bridge) and the parts of the
//! replication engine that care. Cloning is cheap; all clones share
//! the same signal.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared online/offline signal with transition events.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Create a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Connectivity { tx: Arc::new(tx) }
    }

    /// Report the current reachability. No-op if unchanged, so a noisy
    /// probe may call this on every sample.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            if online {
                tracing::info!("network connectivity restored");
            } else {
                tracing::warn!("network connectivity lost");
            }
        }
    }

    /// Current state of the signal.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    /// Starts offline: the engine must never assume reachability it
    /// has not observed.
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
