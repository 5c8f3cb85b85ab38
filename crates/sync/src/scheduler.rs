// SPDX-License-Identifier: MIT

//! Scheduler and trigger policy.
//!
//! Decides *when* a replication pass runs: on reconnect (after a
//! debounce delay to absorb a flapping link), on a periodic timer
//! while online and idle, or on explicit manual request. All three
//! event sources feed one control loop; the loop owns the in-flight
//! pass and the shared in-flight flag is the sole coordination
//! primitive (checked-and-set atomically, so a timer tick and a manual
//! trigger can never start two passes).
//!
//! State machine:
//!
//! ```text
//!            reconnect (debounced)
//!   Offline ──────────────────────► Online-Idle
//!      ▲                             │       ▲
//!      │ offline signal    debounce/ │       │ pass
//!      │ (any state)       timer/    │       │ returns
//!      │                   trigger   ▼       │
//!      └───────────────────────── Online-Syncing
//! ```
//!
//! An in-flight pass is never cancelled: on an offline signal it runs
//! to completion, but no new pass starts and manual triggers are
//! rejected with the offline condition.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use till_core::RecordStore;

use crate::client::PushClient;
use crate::config::SyncConfig;
use crate::connectivity::Connectivity;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::summary::SyncSummary;

const STATE_OFFLINE: u8 = 0;
const STATE_ONLINE_IDLE: u8 = 1;
const STATE_ONLINE_SYNCING: u8 = 2;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No network; nothing starts, triggers are rejected.
    Offline,
    /// Online, no pass in flight.
    OnlineIdle,
    /// Online with a pass in flight (or finishing after going offline).
    OnlineSyncing,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Offline => "offline",
            SchedulerState::OnlineIdle => "idle",
            SchedulerState::OnlineSyncing => "syncing",
        }
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State shared between the control loop and observer handles.
///
/// Atomic fields allow lock-free reads from any calling context.
struct SharedSyncState {
    state: AtomicU8,
    in_flight: AtomicBool,
    last_summary: Mutex<Option<SyncSummary>>,
    last_error: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SharedSyncState {
    fn new(online: bool) -> Self {
        let state = if online {
            STATE_ONLINE_IDLE
        } else {
            STATE_OFFLINE
        };
        SharedSyncState {
            state: AtomicU8::new(state),
            in_flight: AtomicBool::new(false),
            last_summary: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Atomically claim the single-flight slot.
    fn try_begin(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn end(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_state(&self, online: bool, syncing: bool) {
        let state = if !online {
            STATE_OFFLINE
        } else if syncing {
            STATE_ONLINE_SYNCING
        } else {
            STATE_ONLINE_IDLE
        };
        self.state.store(state, Ordering::Release);
    }

    fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::Acquire) {
            STATE_ONLINE_IDLE => SchedulerState::OnlineIdle,
            STATE_ONLINE_SYNCING => SchedulerState::OnlineSyncing,
            _ => SchedulerState::Offline,
        }
    }

    fn record_summary(&self, summary: SyncSummary) {
        *lock(&self.last_error) = None;
        *lock(&self.last_summary) = Some(summary);
    }

    fn record_error(&self, message: String) {
        *lock(&self.last_error) = Some(message);
    }
}

/// Observer and trigger surface handed to the host application.
///
/// Cheap to clone; all clones observe the same scheduler.
#[derive(Clone)]
pub struct SyncHandle {
    shared: Arc<SharedSyncState>,
    connectivity: Connectivity,
    trigger_tx: mpsc::Sender<()>,
    config_tx: Arc<watch::Sender<SyncConfig>>,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// Current online/offline flag.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Whether a pass is in flight right now.
    pub fn is_syncing(&self) -> bool {
        self.shared.is_syncing()
    }

    /// Current scheduler state.
    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// Summary of the most recent completed pass, if any.
    pub fn last_summary(&self) -> Option<SyncSummary> {
        lock(&self.shared.last_summary).clone()
    }

    /// Message of the most recent failed pass attempt, if any.
    /// Cleared by the next successful pass.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.last_error).clone()
    }

    /// Request a pass right now.
    ///
    /// Rejected (never queued) while offline or while a pass is
    /// already in flight. Safe to call from any task.
    pub fn trigger_sync(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::SchedulerStopped);
        }
        if !self.connectivity.is_online() {
            return Err(Error::Offline);
        }
        if !self.shared.try_begin() {
            return Err(Error::AlreadySyncing);
        }
        if self.trigger_tx.try_send(()).is_err() {
            // Control loop gone; release the slot we claimed.
            self.shared.end();
            return Err(Error::SchedulerStopped);
        }
        Ok(())
    }

    /// Swap the scheduler configuration without a process restart.
    /// Timers are rebuilt from the new values.
    pub fn update_config(&self, config: SyncConfig) -> Result<()> {
        self.config_tx
            .send(config)
            .map_err(|_| Error::SchedulerStopped)
    }

    /// Stop the scheduler. An in-flight pass still runs to completion
    /// and its result is recorded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Spawns the control loop for an engine.
pub struct Scheduler;

impl Scheduler {
    /// Start scheduling passes for `engine` and return the handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, P>(engine: Arc<SyncEngine<S, P>>, config: SyncConfig) -> SyncHandle
    where
        S: RecordStore + 'static,
        P: PushClient + 'static,
    {
        let connectivity = engine.connectivity().clone();
        let shared = Arc::new(SharedSyncState::new(connectivity.is_online()));
        let (trigger_tx, trigger_rx) = mpsc::channel(4);
        let (config_tx, config_rx) = watch::channel(config);
        let cancel = CancellationToken::new();

        let handle = SyncHandle {
            shared: Arc::clone(&shared),
            connectivity: connectivity.clone(),
            trigger_tx,
            config_tx: Arc::new(config_tx),
            cancel: cancel.clone(),
        };

        tokio::spawn(control_loop(
            engine,
            connectivity,
            shared,
            trigger_rx,
            config_rx,
            cancel,
        ));

        handle
    }
}

fn spawn_pass<S, P>(engine: &Arc<SyncEngine<S, P>>) -> JoinHandle<Result<SyncSummary>>
where
    S: RecordStore + 'static,
    P: PushClient + 'static,
{
    let engine = Arc::clone(engine);
    tokio::spawn(async move { engine.run_pass().await })
}

/// Await the in-flight pass, or never resolve when there is none.
async fn join_pass(
    pass: &mut Option<JoinHandle<Result<SyncSummary>>>,
) -> std::result::Result<Result<SyncSummary>, tokio::task::JoinError> {
    match pass {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Sleep until the deadline, or never resolve when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn make_interval(config: &SyncConfig) -> time::Interval {
    let period = config.interval().max(time::Duration::from_millis(1));
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn control_loop<S, P>(
    engine: Arc<SyncEngine<S, P>>,
    connectivity: Connectivity,
    shared: Arc<SharedSyncState>,
    mut trigger_rx: mpsc::Receiver<()>,
    mut config_rx: watch::Receiver<SyncConfig>,
    cancel: CancellationToken,
) where
    S: RecordStore + 'static,
    P: PushClient + 'static,
{
    let mut online_rx = connectivity.subscribe();
    let mut config = config_rx.borrow().clone();
    let mut interval = make_interval(&config);
    let mut pass: Option<JoinHandle<Result<SyncSummary>>> = None;
    let mut debounce_deadline: Option<Instant> = None;
    let mut connectivity_alive = true;
    let mut triggers_alive = true;
    let mut config_alive = true;

    // Starting up already online counts as a reconnect: sync shortly
    // after launch instead of waiting a full interval.
    if connectivity.is_online() && config.enable_auto_sync {
        debounce_deadline = Some(Instant::now() + config.debounce());
    }
    shared.set_state(connectivity.is_online(), false);

    loop {
        let idle = pass.is_none();
        let periodic_armed = idle && config.periodic_enabled() && connectivity.is_online();

        tokio::select! {
            _ = cancel.cancelled() => break,

            changed = online_rx.changed(), if connectivity_alive => {
                match changed {
                    Ok(()) => {
                        let online = *online_rx.borrow_and_update();
                        if online {
                            // Debounce the reconnect unless a pass is
                            // already in flight.
                            if config.enable_auto_sync && pass.is_none() {
                                debounce_deadline = Some(Instant::now() + config.debounce());
                            }
                            interval.reset();
                        } else {
                            // Absorb any pending debounce; the
                            // in-flight pass (if any) finishes on its
                            // own.
                            debounce_deadline = None;
                        }
                        shared.set_state(online, pass.is_some());
                    }
                    Err(_) => connectivity_alive = false,
                }
            }

            _ = sleep_until_opt(debounce_deadline), if debounce_deadline.is_some() => {
                debounce_deadline = None;
                if connectivity.is_online()
                    && config.enable_auto_sync
                    && pass.is_none()
                    && shared.try_begin()
                {
                    tracing::debug!("debounce elapsed, starting sync pass");
                    pass = Some(spawn_pass(&engine));
                    shared.set_state(true, true);
                }
            }

            _ = interval.tick(), if periodic_armed => {
                if shared.try_begin() {
                    tracing::debug!("periodic timer fired, starting sync pass");
                    pass = Some(spawn_pass(&engine));
                    shared.set_state(true, true);
                }
            }

            received = trigger_rx.recv(), if triggers_alive => {
                match received {
                    // The trigger path already claimed the
                    // single-flight slot.
                    Some(()) => {
                        if pass.is_none() {
                            tracing::debug!("manual trigger, starting sync pass");
                            debounce_deadline = None;
                            pass = Some(spawn_pass(&engine));
                            shared.set_state(connectivity.is_online(), true);
                        }
                    }
                    None => triggers_alive = false,
                }
            }

            result = join_pass(&mut pass) => {
                pass = None;
                record_outcome(&shared, result);
                shared.end();
                shared.set_state(connectivity.is_online(), false);
                interval.reset();
            }

            changed = config_rx.changed(), if config_alive => {
                match changed {
                    Ok(()) => {
                        config = config_rx.borrow_and_update().clone();
                        interval = make_interval(&config);
                        if !config.enable_auto_sync {
                            debounce_deadline = None;
                        }
                        tracing::info!("sync configuration updated");
                    }
                    Err(_) => config_alive = false,
                }
            }
        }
    }

    // Shutdown: let an in-flight pass finish and record its result.
    if let Some(handle) = pass.take() {
        let result = handle.await;
        record_outcome(&shared, result);
        shared.end();
        shared.set_state(connectivity.is_online(), false);
    }
    tracing::debug!("sync scheduler stopped");
}

fn record_outcome(
    shared: &SharedSyncState,
    result: std::result::Result<Result<SyncSummary>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(summary)) => shared.record_summary(summary),
        Ok(Err(e)) => shared.record_error(e.to_string()),
        Err(e) => shared.record_error(format!("sync task failed: {}", e)),
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
