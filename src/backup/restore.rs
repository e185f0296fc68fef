//! Snapshot restoration for invoice-cli
//!
//! Validates snapshot files and copies one back over the live record store.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::{InvoiceError, InvoiceResult};
use crate::storage::database::has_invoice_table;

use super::manager::{copy_database, BackupInfo, BackupManager};

/// Handles restoring from snapshots
pub struct RestoreManager<'a> {
    backups: &'a BackupManager,
}

impl<'a> RestoreManager<'a> {
    /// Create a new RestoreManager working against the manager's store
    pub fn new(backups: &'a BackupManager) -> Self {
        Self { backups }
    }

    /// Replace the live record store with the contents of a snapshot
    ///
    /// A snapshot of the current store is taken first, so a restore can
    /// itself be undone.
    pub fn restore_from_file(&self, backup_path: &Path) -> InvoiceResult<RestoreResult> {
        let validation = self.validate_backup(backup_path)?;
        if !validation.is_valid {
            return Err(InvoiceError::Backup(format!(
                "{} is not a valid invoice snapshot",
                backup_path.display()
            )));
        }

        let database = self.backups.database();
        let pre_restore = if database.path().exists() {
            Some(self.backups.snapshot()?)
        } else {
            database.initialize()?;
            None
        };

        let source = Connection::open_with_flags(backup_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| InvoiceError::Backup(format!("Failed to open snapshot: {}", e)))?;
        let mut live = database.connect()?;
        copy_database(&source, &mut live)
            .map_err(|e| InvoiceError::Backup(format!("Failed to restore snapshot: {}", e)))?;

        log::info!(
            "Restored record store from {} ({} invoices)",
            backup_path.display(),
            validation.invoice_count
        );

        // The restored file is safe now; the pre-restore snapshot may push
        // the oldest one out
        self.backups.enforce_retention()?;

        Ok(RestoreResult {
            source: backup_path.to_path_buf(),
            invoice_count: validation.invoice_count,
            pre_restore,
        })
    }

    /// Validate a snapshot file without restoring it
    ///
    /// An unreadable or foreign file yields `is_valid: false`; only a
    /// missing file is an error.
    pub fn validate_backup(&self, backup_path: &Path) -> InvoiceResult<ValidationResult> {
        if !backup_path.is_file() {
            return Err(InvoiceError::backup_not_found(
                backup_path.display().to_string(),
            ));
        }

        let invoice_count = Connection::open_with_flags(backup_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(InvoiceError::from)
            .and_then(|conn| {
                if !has_invoice_table(&conn)? {
                    return Ok(None);
                }
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))?;
                Ok(Some(count))
            });

        Ok(match invoice_count {
            Ok(Some(count)) => ValidationResult {
                is_valid: true,
                invoice_count: count,
                error: None,
            },
            Ok(None) => ValidationResult {
                is_valid: false,
                invoice_count: 0,
                error: Some("missing invoices table".to_string()),
            },
            Err(e) => ValidationResult {
                is_valid: false,
                invoice_count: 0,
                error: Some(e.to_string()),
            },
        })
    }
}

/// Result of a restore operation
#[derive(Debug)]
pub struct RestoreResult {
    /// Snapshot that was restored
    pub source: PathBuf,
    /// Number of invoices in the restored store
    pub invoice_count: i64,
    /// Snapshot of the store as it was before the restore
    pub pre_restore: Option<BackupInfo>,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!("Restored {} invoices", self.invoice_count)
    }
}

/// Result of validating a snapshot
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the file opens as a store with the invoices table
    pub is_valid: bool,
    /// Number of invoices in the snapshot
    pub invoice_count: i64,
    /// Why the snapshot is not valid
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn summary(&self) -> String {
        match (&self.error, self.is_valid) {
            (_, true) => format!("Valid snapshot with {} invoices", self.invoice_count),
            (Some(reason), false) => format!("Invalid snapshot: {}", reason),
            (None, false) => "Invalid snapshot".to_string(),
        }
    }
}
