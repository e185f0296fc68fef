//! SQLite record store access
//!
//! Every operation acquires its own connection, executes, and releases it.
//! No connection or transaction is held across user interaction, which is
//! what lets the backup scheduler copy the file from another thread.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{InvoiceError, InvoiceResult};

/// How long a statement waits on a locked store before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    platform TEXT,
    expense_type TEXT NOT NULL,
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    note TEXT,
    pdf_path TEXT,
    reimbursed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
";

/// Handle to the record store file
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a short-lived connection to the store
    pub fn connect(&self) -> InvoiceResult<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| {
            InvoiceError::Database(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create the store file and the `invoices` table if missing
    pub fn initialize(&self) -> InvoiceResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InvoiceError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Record store ready at {}", self.path.display());
        Ok(())
    }

    /// Open and immediately close a connection so pending writes settle
    pub fn flush(&self) -> InvoiceResult<()> {
        let conn = self.connect()?;
        conn.close().map_err(|(_, e)| InvoiceError::from(e))
    }
}

/// Check that a file opens as a store with the `invoices` table
pub fn has_invoice_table(conn: &Connection) -> InvoiceResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'invoices'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
