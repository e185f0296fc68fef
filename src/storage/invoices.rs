//! Invoice repository for SQLite storage
//!
//! Each method is one short-lived connection running one statement.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::database::Database;
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{ExpenseType, Invoice, InvoiceRow, Money, NewInvoice, TIMESTAMP_FORMAT};
use crate::query::{filter, ListStats};

const ROW_COLUMNS: &str =
    "id, content, platform, expense_type, amount_cents, reimbursed, created_at";

const FULL_COLUMNS: &str =
    "id, content, platform, expense_type, amount_cents, note, pdf_path, reimbursed, created_at";

/// Repository for invoice persistence
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: Database,
}

impl InvoiceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Rows matching `term`, newest id first
    ///
    /// An empty term returns every row.
    pub fn query(&self, term: &str) -> InvoiceResult<Vec<InvoiceRow>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM invoices ORDER BY id DESC",
            ROW_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(filter(&rows, term))
    }

    /// Count and total of the rows matching `term`
    pub fn stats(&self, term: &str) -> InvoiceResult<ListStats> {
        Ok(ListStats::from_rows(&self.query(term)?))
    }

    /// Get a full record by id
    pub fn get(&self, id: i64) -> InvoiceResult<Option<Invoice>> {
        let conn = self.db.connect()?;
        let invoice = conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?1", FULL_COLUMNS),
                params![id],
                map_invoice,
            )
            .optional()?;
        Ok(invoice)
    }

    /// Get a full record by id, failing if it does not exist
    pub fn get_required(&self, id: i64) -> InvoiceResult<Invoice> {
        self.get(id)?
            .ok_or_else(|| InvoiceError::invoice_not_found(id))
    }

    /// Every full record, newest id first
    pub fn get_all(&self) -> InvoiceResult<Vec<Invoice>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM invoices ORDER BY id DESC",
            FULL_COLUMNS
        ))?;
        let invoices = stmt
            .query_map([], map_invoice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invoices)
    }

    /// Insert a record stamped with the current local time; returns its id
    pub fn insert(&self, invoice: &NewInvoice) -> InvoiceResult<i64> {
        let created_at = Local::now().naive_local();
        self.insert_at(invoice, created_at)
    }

    /// Insert a record with an explicit creation time; returns its id
    pub fn insert_at(&self, invoice: &NewInvoice, created_at: NaiveDateTime) -> InvoiceResult<i64> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO invoices
             (content, platform, expense_type, amount_cents, note, pdf_path, reimbursed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                invoice.content,
                invoice.platform,
                invoice.expense_type.as_str(),
                invoice.amount.cents(),
                invoice.note,
                path_to_text(&invoice.pdf_path)?,
                invoice.reimbursed,
                created_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrite every mutable field of a record
    pub fn update(&self, id: i64, invoice: &NewInvoice) -> InvoiceResult<()> {
        let conn = self.db.connect()?;
        let changed = conn.execute(
            "UPDATE invoices
             SET content = ?1, platform = ?2, expense_type = ?3, amount_cents = ?4,
                 note = ?5, pdf_path = ?6, reimbursed = ?7
             WHERE id = ?8",
            params![
                invoice.content,
                invoice.platform,
                invoice.expense_type.as_str(),
                invoice.amount.cents(),
                invoice.note,
                path_to_text(&invoice.pdf_path)?,
                invoice.reimbursed,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(InvoiceError::invoice_not_found(id));
        }
        Ok(())
    }

    /// Set the reimbursed flag of a record
    pub fn set_reimbursed(&self, id: i64, reimbursed: bool) -> InvoiceResult<()> {
        let conn = self.db.connect()?;
        let changed = conn.execute(
            "UPDATE invoices SET reimbursed = ?1 WHERE id = ?2",
            params![reimbursed, id],
        )?;

        if changed == 0 {
            return Err(InvoiceError::invoice_not_found(id));
        }
        Ok(())
    }

    /// Delete a record
    pub fn delete(&self, id: i64) -> InvoiceResult<()> {
        let conn = self.db.connect()?;
        let changed = conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(InvoiceError::invoice_not_found(id));
        }
        Ok(())
    }

    /// Number of stored records
    pub fn count(&self) -> InvoiceResult<i64> {
        let conn = self.db.connect()?;
        let count = conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn path_to_text(path: &Option<PathBuf>) -> InvoiceResult<Option<String>> {
    path.as_ref()
        .map(|p| {
            p.to_str().map(str::to_string).ok_or_else(|| {
                InvoiceError::Attachment(format!("Path is not valid UTF-8: {}", p.display()))
            })
        })
        .transpose()
}

fn parse_expense_type(row: &Row<'_>, idx: usize) -> rusqlite::Result<ExpenseType> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: InvoiceError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<InvoiceRow> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        content: row.get(1)?,
        platform: row.get(2)?,
        expense_type: parse_expense_type(row, 3)?,
        amount: Money::from_cents(row.get(4)?),
        reimbursed: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
    })
}

fn map_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let pdf_path: Option<String> = row.get(6)?;
    Ok(Invoice {
        id: row.get(0)?,
        content: row.get(1)?,
        platform: row.get(2)?,
        expense_type: parse_expense_type(row, 3)?,
        amount: Money::from_cents(row.get(4)?),
        note: row.get(5)?,
        pdf_path: pdf_path.map(PathBuf::from),
        reimbursed: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
    })
}
