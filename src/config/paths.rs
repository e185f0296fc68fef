//! Path management for invoice-cli
//!
//! Provides path resolution for configuration, the record store, managed
//! attachments and backups.
//!
//! ## Path Resolution Order
//!
//! 1. `INVOICE_CLI_DATA_DIR` environment variable (if set)
//! 2. The platform data directory reported by `directories`
//!    (e.g. `~/.local/share/invoice-cli` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::InvoiceError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "INVOICE_CLI_DATA_DIR";

/// Manages all paths used by invoice-cli
#[derive(Debug, Clone)]
pub struct InvoicePaths {
    /// Base directory for all invoice-cli data
    base_dir: PathBuf,
}

impl InvoicePaths {
    /// Create a new InvoicePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no platform data directory can be determined.
    pub fn new() -> Result<Self, InvoiceError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create InvoicePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding the record store
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the managed attachment directory
    pub fn attachment_dir(&self) -> PathBuf {
        self.base_dir.join("invoices_pdf")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the record store
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("invoices.db")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), InvoiceError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| InvoiceError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| InvoiceError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.attachment_dir()).map_err(|e| {
            InvoiceError::Io(format!("Failed to create attachment directory: {}", e))
        })?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| InvoiceError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }

    /// Check if invoice-cli has been initialized (record store exists)
    pub fn is_initialized(&self) -> bool {
        self.database_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, InvoiceError> {
    ProjectDirs::from("", "", "invoice-cli")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| InvoiceError::Config("Could not determine a data directory".into()))
}
