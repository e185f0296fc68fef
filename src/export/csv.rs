//! CSV Export functionality
//!
//! Exports invoices to a spreadsheet-compatible CSV file.

use std::io::Write;

use crate::error::InvoiceResult;
use crate::models::{Invoice, TIMESTAMP_FORMAT};
use crate::query::sort::reimbursed_label;
use crate::storage::Storage;

const HEADER: [&str; 9] = [
    "ID",
    "Content",
    "Platform",
    "Type",
    "Amount",
    "Reimbursed",
    "Created",
    "Note",
    "Attachment",
];

/// Export all invoices to CSV, newest first; returns the number written
pub fn export_invoices_csv<W: Write + ?Sized>(
    storage: &Storage,
    writer: &mut W,
) -> InvoiceResult<usize> {
    let invoices = storage.invoices.get_all()?;
    write_invoices_csv(&invoices, writer)?;
    Ok(invoices.len())
}

/// Write `invoices` as CSV records under the standard header
pub fn write_invoices_csv<W: Write + ?Sized>(
    invoices: &[Invoice],
    writer: &mut W,
) -> InvoiceResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for invoice in invoices {
        let attachment = invoice
            .pdf_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        csv_writer.write_record([
            invoice.id.to_string(),
            invoice.content.clone(),
            invoice.platform.clone().unwrap_or_default(),
            invoice.expense_type.as_str().to_string(),
            invoice.amount.to_string(),
            reimbursed_label(invoice.reimbursed).to_string(),
            invoice.created_at.format(TIMESTAMP_FORMAT).to_string(),
            invoice.note.clone().unwrap_or_default(),
            attachment,
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
