//! Storage layer for invoice-cli
//!
//! Provides the SQLite record store, the invoice repository and the managed
//! attachment directory.

pub mod attachments;
pub mod database;
pub mod invoices;

pub use attachments::AttachmentStore;
pub use database::Database;
pub use invoices::InvoiceRepository;

use crate::config::paths::InvoicePaths;
use crate::error::InvoiceError;

/// Main storage coordinator that provides access to the store and attachments
pub struct Storage {
    paths: InvoicePaths,
    pub database: Database,
    pub invoices: InvoiceRepository,
    pub attachments: AttachmentStore,
}

impl Storage {
    /// Create a new Storage instance, creating directories and the schema
    pub fn new(paths: InvoicePaths) -> Result<Self, InvoiceError> {
        paths.ensure_directories()?;

        let database = Database::new(paths.database_file());
        database.initialize()?;

        Ok(Self {
            invoices: InvoiceRepository::new(database.clone()),
            attachments: AttachmentStore::new(paths.attachment_dir()),
            database,
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &InvoicePaths {
        &self.paths
    }
}
