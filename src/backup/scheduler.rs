//! Background snapshot scheduler
//!
//! One worker thread takes a snapshot as soon as it starts, then every
//! `interval`. A failed snapshot is logged and retried after
//! `error_cooldown`; the loop only ends when the scheduler is stopped.
//! A panic inside an attempt counts as a failed attempt.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{InvoiceError, InvoiceResult};

use super::manager::{BackupInfo, BackupManager};

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// No worker thread
    #[default]
    Idle,
    /// Worker waiting for the next period
    Running,
    /// Worker copying the store
    Snapshotting,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Snapshotting => write!(f, "snapshotting"),
        }
    }
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    /// Filename of the most recent successful snapshot
    pub last_snapshot: Option<String>,
    /// Message of the most recent failure, cleared on success
    pub last_error: Option<String>,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Successful snapshots since the scheduler was created
    pub total_snapshots: u64,
}

impl SchedulerStatus {
    fn record(&mut self, result: &InvoiceResult<BackupInfo>) {
        match result {
            Ok(info) => {
                self.last_snapshot = Some(info.filename.clone());
                self.last_error = None;
                self.consecutive_failures = 0;
                self.total_snapshots += 1;
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.consecutive_failures += 1;
            }
        }
    }
}

/// One snapshot attempt run by the scheduler
pub trait SnapshotJob: Send + Sync + 'static {
    fn run(&self) -> InvoiceResult<BackupInfo>;
}

impl SnapshotJob for BackupManager {
    fn run(&self) -> InvoiceResult<BackupInfo> {
        self.create_backup()
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Sets the state back to `Idle` when the worker thread exits
struct IdleOnExit(Arc<Mutex<SchedulerStatus>>);

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        lock(&self.0).state = SchedulerState::Idle;
    }
}

/// Recurring background snapshots of the record store
pub struct BackupScheduler<M: SnapshotJob = BackupManager> {
    manager: Arc<M>,
    interval: Duration,
    error_cooldown: Duration,
    status: Arc<Mutex<SchedulerStatus>>,
    worker: Option<Worker>,
}

impl<M: SnapshotJob> BackupScheduler<M> {
    pub fn new(manager: Arc<M>, interval: Duration, error_cooldown: Duration) -> Self {
        Self {
            manager,
            interval,
            error_cooldown,
            status: Arc::new(Mutex::new(SchedulerStatus::default())),
            worker: None,
        }
    }

    /// Start the background loop
    ///
    /// Returns `false` without spawning anything if the loop is already
    /// running or the thread cannot be spawned.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            log::debug!("Backup scheduler already running");
            return false;
        }
        if let Some(worker) = self.worker.take() {
            // Reap a worker that ended on its own
            let _ = worker.handle.join();
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let manager = Arc::clone(&self.manager);
        let status = Arc::clone(&self.status);
        let interval = self.interval;
        let error_cooldown = self.error_cooldown;

        lock(&status).state = SchedulerState::Running;

        let spawned = thread::Builder::new()
            .name("backup-scheduler".to_string())
            .spawn(move || {
                run_worker(manager.as_ref(), &status, &stop_rx, interval, error_cooldown)
            });

        match spawned {
            Ok(handle) => {
                log::info!(
                    "Backup scheduler started (every {}s)",
                    self.interval.as_secs()
                );
                self.worker = Some(Worker { stop_tx, handle });
                true
            }
            Err(e) => {
                log::error!("Failed to start backup scheduler: {}", e);
                lock(&self.status).state = SchedulerState::Idle;
                false
            }
        }
    }

    /// Stop the background loop and wait for the worker to exit
    ///
    /// Returns whether a loop was running. A snapshot in progress is
    /// allowed to finish.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        // The worker may already be gone; disconnect is a stop signal too
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            log::error!("Backup scheduler thread panicked");
        }

        lock(&self.status).state = SchedulerState::Idle;
        log::info!("Backup scheduler stopped");
        true
    }

    /// Take a snapshot now on the calling thread
    pub fn backup_now(&self) -> InvoiceResult<BackupInfo> {
        let result = attempt(self.manager.as_ref());
        lock(&self.status).record(&result);
        result
    }

    pub fn status(&self) -> SchedulerStatus {
        lock(&self.status).clone()
    }

    /// Whether a worker thread is alive
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }
}

impl<M: SnapshotJob> Drop for BackupScheduler<M> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The scheduler loop: snapshot, then wait the interval or the cooldown
fn run_worker<M: SnapshotJob>(
    manager: &M,
    status: &Arc<Mutex<SchedulerStatus>>,
    stop_rx: &Receiver<()>,
    interval: Duration,
    error_cooldown: Duration,
) {
    let _idle = IdleOnExit(Arc::clone(status));

    loop {
        lock(status).state = SchedulerState::Snapshotting;
        let result = attempt(manager);

        let wait = match &result {
            Ok(_) => interval,
            Err(e) => {
                log::error!(
                    "Scheduled backup failed, retrying in {}s: {}",
                    error_cooldown.as_secs(),
                    e
                );
                error_cooldown
            }
        };

        {
            let mut status = lock(status);
            status.record(&result);
            status.state = SchedulerState::Running;
        }

        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Run one attempt, turning a panic into an error
fn attempt<M: SnapshotJob + ?Sized>(job: &M) -> InvoiceResult<BackupInfo> {
    panic::catch_unwind(AssertUnwindSafe(|| job.run())).unwrap_or_else(|payload| {
        Err(InvoiceError::Backup(format!(
            "Snapshot attempt panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn lock(status: &Mutex<SchedulerStatus>) -> MutexGuard<'_, SchedulerStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
