//! JSON Export functionality
//!
//! Exports every invoice to JSON with schema versioning.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{Invoice, Money};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full invoice export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// All invoices, newest first
    pub invoices: Vec<Invoice>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub invoice_count: usize,

    pub reimbursed_count: usize,

    /// Sum of all amounts, in cents
    pub total: Money,

    /// Sum of amounts not yet reimbursed, in cents
    pub outstanding: Money,

    /// Creation time of the oldest invoice
    pub earliest_invoice: Option<String>,

    /// Creation time of the newest invoice
    pub latest_invoice: Option<String>,
}

impl InvoiceExport {
    /// Build an export of the whole store
    pub fn from_storage(storage: &Storage) -> InvoiceResult<Self> {
        Ok(Self::from_invoices(storage.invoices.get_all()?))
    }

    pub fn from_invoices(invoices: Vec<Invoice>) -> Self {
        let metadata = ExportMetadata {
            invoice_count: invoices.len(),
            reimbursed_count: invoices.iter().filter(|i| i.reimbursed).count(),
            total: invoices.iter().map(|i| i.amount).sum(),
            outstanding: invoices
                .iter()
                .filter(|i| !i.reimbursed)
                .map(|i| i.amount)
                .sum(),
            earliest_invoice: invoices.iter().map(|i| i.created_at).min().map(|d| d.to_string()),
            latest_invoice: invoices.iter().map(|i| i.created_at).max().map(|d| d.to_string()),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            invoices,
            metadata,
        }
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        if self.metadata.invoice_count != self.invoices.len() {
            return Err(format!(
                "Metadata lists {} invoices but the export contains {}",
                self.metadata.invoice_count,
                self.invoices.len()
            ));
        }

        let mut ids = std::collections::HashSet::new();
        for invoice in &self.invoices {
            if !ids.insert(invoice.id) {
                return Err(format!("Duplicate invoice id {}", invoice.id));
            }
        }

        Ok(())
    }
}

/// Export every invoice to JSON; returns the number written
pub fn export_invoices_json<W: Write + ?Sized>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> InvoiceResult<usize> {
    let export = InvoiceExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| InvoiceError::Export(e.to_string()))?;

    Ok(export.metadata.invoice_count)
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> InvoiceResult<InvoiceExport> {
    let export: InvoiceExport = serde_json::from_str(json_str)
        .map_err(|e| InvoiceError::Export(format!("Invalid export file: {}", e)))?;

    export.validate().map_err(InvoiceError::Export)?;
    Ok(export)
}
