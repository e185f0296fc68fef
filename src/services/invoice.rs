//! Invoice service
//!
//! Business logic for the add, edit, toggle and delete flows: validation
//! before any write, and ownership of the managed attachment copy.

use std::path::{Path, PathBuf};

use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{Invoice, InvoiceRow, NewInvoice};
use crate::storage::Storage;

/// What an edit does to the record's attachment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttachmentChange {
    /// Leave the current attachment as is
    #[default]
    Keep,
    /// Copy a new file in and drop the old copy
    Replace(PathBuf),
    /// Drop the current attachment
    Remove,
}

/// Service for invoice management
pub struct InvoiceService<'a> {
    storage: &'a Storage,
}

impl<'a> InvoiceService<'a> {
    /// Create a new invoice service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new invoice, copying `attachment` into the managed directory
    ///
    /// A failed copy aborts the save: no row is written.
    pub fn create(&self, input: NewInvoice, attachment: Option<&Path>) -> InvoiceResult<Invoice> {
        let mut invoice = input.normalized();
        invoice.validate()?;

        let stored = match attachment {
            Some(source) => Some(
                self.storage
                    .attachments
                    .store_attachment(source, &naming_key(&invoice))?,
            ),
            None => None,
        };
        invoice.pdf_path = stored.clone();

        let id = match self.storage.invoices.insert(&invoice) {
            Ok(id) => id,
            Err(e) => {
                if let Some(path) = stored {
                    self.storage.attachments.remove_attachment(&path);
                }
                return Err(e);
            }
        };

        log::info!("Created invoice {} ({})", id, invoice.content);
        self.storage.invoices.get_required(id)
    }

    /// Overwrite an invoice's fields and apply an attachment change
    ///
    /// The previous attachment copy is removed once the update is stored.
    pub fn update(
        &self,
        id: i64,
        input: NewInvoice,
        attachment: AttachmentChange,
    ) -> InvoiceResult<Invoice> {
        let existing = self.storage.invoices.get_required(id)?;

        let mut invoice = input.normalized();
        invoice.validate()?;

        let mut newly_stored = None;
        invoice.pdf_path = match attachment {
            AttachmentChange::Keep => existing.pdf_path.clone(),
            AttachmentChange::Remove => None,
            AttachmentChange::Replace(source) => {
                if existing.pdf_path.as_deref() == Some(source.as_path()) {
                    existing.pdf_path.clone()
                } else {
                    let path = self
                        .storage
                        .attachments
                        .store_attachment(&source, &naming_key(&invoice))?;
                    newly_stored = Some(path.clone());
                    Some(path)
                }
            }
        };

        if let Err(e) = self.storage.invoices.update(id, &invoice) {
            if let Some(path) = newly_stored {
                self.storage.attachments.remove_attachment(&path);
            }
            return Err(e);
        }

        if let Some(old) = &existing.pdf_path {
            if invoice.pdf_path.as_ref() != Some(old) {
                self.storage.attachments.remove_attachment(old);
            }
        }

        log::info!("Updated invoice {}", id);
        self.storage.invoices.get_required(id)
    }

    /// Flip the reimbursed flag; returns the new value
    pub fn toggle_reimbursed(&self, id: i64) -> InvoiceResult<bool> {
        let invoice = self.storage.invoices.get_required(id)?;
        let reimbursed = !invoice.reimbursed;
        self.storage.invoices.set_reimbursed(id, reimbursed)?;
        log::info!("Invoice {} reimbursed: {}", id, reimbursed);
        Ok(reimbursed)
    }

    /// Delete an invoice and its owned attachment; returns the removed record
    pub fn delete(&self, id: i64) -> InvoiceResult<Invoice> {
        let invoice = self.storage.invoices.get_required(id)?;
        self.storage.invoices.delete(id)?;

        if let Some(path) = &invoice.pdf_path {
            self.storage.attachments.remove_attachment(path);
        }

        log::info!("Deleted invoice {}", id);
        Ok(invoice)
    }

    pub fn get(&self, id: i64) -> InvoiceResult<Invoice> {
        self.storage.invoices.get_required(id)
    }

    /// Rows matching `term`, newest first
    pub fn list(&self, term: &str) -> InvoiceResult<Vec<InvoiceRow>> {
        self.storage.invoices.query(term)
    }

    /// Path of an invoice's attachment, checked to exist on disk
    pub fn attachment_path(&self, id: i64) -> InvoiceResult<PathBuf> {
        let invoice = self.storage.invoices.get_required(id)?;
        let path = invoice.pdf_path.ok_or_else(|| {
            InvoiceError::Attachment(format!("Invoice {} has no attachment", id))
        })?;

        if !path.exists() {
            return Err(InvoiceError::Attachment(format!(
                "Attachment file is missing: {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

/// `{content}_{amount}`, the base name of a stored attachment
fn naming_key(invoice: &NewInvoice) -> String {
    format!("{}_{}", invoice.content, invoice.amount)
}
