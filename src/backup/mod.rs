//! Backup system for invoice-cli
//!
//! Point-in-time snapshots of the record store, a background scheduler that
//! takes them on a fixed period, and restore.
//!
//! # Architecture
//!
//! - `BackupManager`: creates snapshots with SQLite's online backup API and
//!   keeps the newest `retention` of them
//! - `BackupScheduler`: a worker thread that snapshots on start and then
//!   every interval, backing off after failures
//! - `RestoreManager`: validates and restores snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use invoice_cli::backup::{BackupManager, BackupScheduler};
//! use invoice_cli::config::{InvoicePaths, Settings};
//!
//! let paths = InvoicePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let manager = Arc::new(BackupManager::new(&paths, settings.backup.clone()));
//!
//! let mut scheduler = BackupScheduler::new(
//!     manager,
//!     settings.backup.interval(),
//!     settings.backup.error_cooldown(),
//! );
//! scheduler.start();
//! // ...
//! scheduler.stop();
//! ```

mod manager;
mod restore;
mod scheduler;

pub use manager::{BackupInfo, BackupManager};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
pub use scheduler::{BackupScheduler, SchedulerState, SchedulerStatus, SnapshotJob};
