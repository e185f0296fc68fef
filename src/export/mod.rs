//! Export module for invoice-cli
//!
//! Provides data export in two formats:
//! - CSV: one row per invoice (spreadsheet-compatible)
//! - JSON: machine-readable full export with metadata

pub mod csv;
pub mod json;

pub use self::csv::export_invoices_csv;
pub use self::json::{export_invoices_json, import_from_json, InvoiceExport, EXPORT_SCHEMA_VERSION};
