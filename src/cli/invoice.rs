//! Invoice CLI commands
//!
//! Implements the record-level commands: add, edit, show, list, delete,
//! toggle and open.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_invoice_details, format_invoice_table};
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::{ExpenseType, Money, NewInvoice};
use crate::query::{Column, InvoiceListView};
use crate::services::{AttachmentChange, InvoiceService};
use crate::storage::Storage;

/// Invoice subcommands
#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Record a new invoice
    Add {
        /// What was bought
        content: String,
        /// Amount (e.g., "35", "35.50" or "¥ 1,234.50")
        amount: String,
        /// Where it was bought
        #[arg(short, long)]
        platform: Option<String>,
        /// Expense type (advanced/垫付 or self-paid/自费)
        #[arg(short = 't', long = "type", default_value = "advanced")]
        expense_type: String,
        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
        /// PDF receipt to attach (a copy is kept in the data directory)
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Edit an invoice
    Edit {
        /// Invoice ID
        id: i64,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New platform (empty to clear)
        #[arg(short, long)]
        platform: Option<String>,
        /// New expense type
        #[arg(short = 't', long = "type")]
        expense_type: Option<String>,
        /// New note (empty to clear)
        #[arg(short, long)]
        note: Option<String>,
        /// Replace the attachment with this PDF
        #[arg(long, conflicts_with = "remove_pdf")]
        pdf: Option<PathBuf>,
        /// Drop the current attachment
        #[arg(long)]
        remove_pdf: bool,
    },
    /// Show invoice details
    Show {
        /// Invoice ID
        id: i64,
    },
    /// List invoices, newest first
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search on content, platform and type
        #[arg(short, long)]
        search: Option<String>,
        /// Sort by column; repeat to toggle (id, content, platform, type, amount, reimbursed, created)
        #[arg(long = "sort", value_name = "COLUMN")]
        sort: Vec<String>,
    },
    /// Delete an invoice and its attachment
    Delete {
        /// Invoice ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Flip the reimbursed flag
    Toggle {
        /// Invoice ID
        id: i64,
    },
    /// Print the attachment path after checking it exists
    Open {
        /// Invoice ID
        id: i64,
    },
}

/// Handle an invoice command
pub fn handle_invoice_command(
    storage: &Storage,
    settings: &Settings,
    cmd: InvoiceCommands,
) -> InvoiceResult<()> {
    let service = InvoiceService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        InvoiceCommands::Add {
            content,
            amount,
            platform,
            expense_type,
            note,
            pdf,
        } => {
            let mut input = NewInvoice::new(
                content,
                expense_type.parse::<ExpenseType>()?,
                parse_amount(&amount)?,
            );
            input.platform = platform;
            input.note = note;

            let invoice = service.create(input, pdf.as_deref())?;

            println!("Created invoice: {}", invoice.content);
            println!("  Amount: {}", invoice.amount.format_with_symbol(symbol));
            println!("  Type: {}", invoice.expense_type);
            if let Some(path) = &invoice.pdf_path {
                println!("  Attachment: {}", path.display());
            }
            println!("  ID: {}", invoice.id);
        }

        InvoiceCommands::Edit {
            id,
            content,
            amount,
            platform,
            expense_type,
            note,
            pdf,
            remove_pdf,
        } => {
            let existing = service.get(id)?;

            let attachment = match (pdf, remove_pdf) {
                (Some(path), _) => AttachmentChange::Replace(path),
                (None, true) => AttachmentChange::Remove,
                (None, false) => AttachmentChange::Keep,
            };

            let unchanged = content.is_none()
                && amount.is_none()
                && platform.is_none()
                && expense_type.is_none()
                && note.is_none()
                && attachment == AttachmentChange::Keep;
            if unchanged {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let mut input = existing.to_new();
            if let Some(content) = content {
                input.content = content;
            }
            if let Some(amount) = amount {
                input.amount = parse_amount(&amount)?;
            }
            if let Some(platform) = platform {
                input.platform = Some(platform);
            }
            if let Some(expense_type) = expense_type {
                input.expense_type = expense_type.parse()?;
            }
            if let Some(note) = note {
                input.note = Some(note);
            }

            let updated = service.update(id, input, attachment)?;
            println!("Updated invoice {}: {}", updated.id, updated.content);
        }

        InvoiceCommands::Show { id } => {
            let invoice = service.get(id)?;
            print!("{}", format_invoice_details(&invoice, symbol));
        }

        InvoiceCommands::List { search, sort } => {
            let columns = sort
                .iter()
                .map(|name| name.parse::<Column>())
                .collect::<InvoiceResult<Vec<_>>>()?;

            let mut view = InvoiceListView::new(symbol);
            view.refresh(service.list("")?);
            if let Some(term) = search {
                view.set_search(&term);
            }
            for column in columns {
                view.sort_by(column);
            }

            print!("{}", format_invoice_table(&view));
        }

        InvoiceCommands::Delete { id, force } => {
            let invoice = service.get(id)?;

            if !force {
                println!(
                    "About to delete invoice {}: {} ({})",
                    invoice.id,
                    invoice.content,
                    invoice.amount.format_with_symbol(symbol)
                );
                if invoice.pdf_path.is_some() {
                    println!("Its attachment will be deleted as well.");
                }
                println!("To proceed, run again with --force flag:");
                println!("  invoice delete {} --force", id);
                return Ok(());
            }

            let removed = service.delete(id)?;
            println!("Deleted invoice {}: {}", removed.id, removed.content);
        }

        InvoiceCommands::Toggle { id } => {
            let reimbursed = service.toggle_reimbursed(id)?;
            println!(
                "Invoice {} is now {}",
                id,
                if reimbursed { "reimbursed" } else { "not reimbursed" }
            );
        }

        InvoiceCommands::Open { id } => {
            let path = service.attachment_path(id)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Parse a user-entered amount
pub fn parse_amount(amount: &str) -> InvoiceResult<Money> {
    Money::parse(amount).map_err(|e| {
        InvoiceError::Validation(format!(
            "Invalid amount: '{}'. Use format like '35.50' or '35'. Error: {}",
            amount, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("35.5").unwrap(), Money::from_cents(3550));
        assert_eq!(parse_amount("¥ 1,234.50").unwrap(), Money::from_cents(123450));

        let err = parse_amount("abc").unwrap_err();
        assert!(err.is_validation());
    }
}
