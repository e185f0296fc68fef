//! Interactive session
//!
//! A line-oriented loop over the invoice list: search, sort, select and
//! act on rows while the backup scheduler snapshots the store in the
//! background.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::backup::{BackupManager, BackupScheduler};
use crate::config::paths::InvoicePaths;
use crate::config::settings::Settings;
use crate::display::{format_invoice_details, format_invoice_table};
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::TIMESTAMP_FORMAT;
use crate::query::{Column, InvoiceListView};
use crate::services::InvoiceService;
use crate::storage::Storage;

const PROMPT: &str = "invoice> ";

const HELP: &str = "\
Commands:
  list                 Show the current list
  search <text>        Filter by content, platform or type (empty clears)
  sort <column>        Sort by column; repeat to reverse
  select [id]          Select a visible invoice (no id clears)
  show [id]            Show details (defaults to the selection)
  toggle [id]          Flip the reimbursed flag
  delete [id]          Delete an invoice and its attachment
  refresh              Reload from the store
  backup               Take a snapshot now
  status               Show the backup scheduler status
  help                 Show this help
  quit                 Leave the session
";

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    /// Ask before deleting this invoice
    ConfirmDelete(i64),
}

/// State of one interactive session
pub struct Session<'a> {
    storage: &'a Storage,
    view: InvoiceListView,
    scheduler: BackupScheduler,
}

impl<'a> Session<'a> {
    pub fn new(storage: &'a Storage, settings: &Settings, scheduler: BackupScheduler) -> Self {
        Self {
            storage,
            view: InvoiceListView::new(settings.currency_symbol.clone()),
            scheduler,
        }
    }

    /// Read commands from `input` until `quit` or end of input
    ///
    /// The scheduler runs for the lifetime of the loop. Command errors are
    /// printed and the loop continues.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> InvoiceResult<()> {
        self.scheduler.start();
        self.reload()?;
        write!(output, "{}", format_invoice_table(&self.view))?;

        let mut lines = input.lines();
        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                writeln!(output)?;
                break;
            };

            match self.execute(&line, output) {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Quit) => break,
                Ok(Outcome::ConfirmDelete(id)) => {
                    write!(output, "Delete invoice {}? [y/N] ", id)?;
                    output.flush()?;

                    let answer = lines.next().transpose()?.unwrap_or_default();
                    if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                        if let Err(e) = self.delete(id, output) {
                            writeln!(output, "Error: {}", e)?;
                        }
                    } else {
                        writeln!(output, "Cancelled.")?;
                    }
                }
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
        }

        self.scheduler.stop();
        Ok(())
    }

    /// Execute one command line
    pub fn execute<W: Write>(&mut self, line: &str, output: &mut W) -> InvoiceResult<Outcome> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };
        let service = InvoiceService::new(self.storage);

        match command.to_lowercase().as_str() {
            "" => {}
            "help" | "?" => write!(output, "{}", HELP)?,
            "quit" | "exit" | "q" => return Ok(Outcome::Quit),

            "list" | "ls" => write!(output, "{}", format_invoice_table(&self.view))?,
            "search" => {
                self.view.set_search(arg);
                write!(output, "{}", format_invoice_table(&self.view))?;
            }
            "sort" => {
                let column: Column = arg.parse()?;
                let direction = self.view.sort_by(column);
                writeln!(output, "Sorted by {} {}", column.title(), direction.arrow())?;
                write!(output, "{}", format_invoice_table(&self.view))?;
            }
            "select" if arg.is_empty() => {
                self.view.clear_selection();
                writeln!(output, "Selection cleared")?;
            }
            "select" => {
                let id = parse_id(arg)?;
                if !self.view.select(id) {
                    return Err(InvoiceError::Validation(format!(
                        "Invoice {} is not in the current list",
                        id
                    )));
                }
                writeln!(output, "Selected invoice {}", id)?;
            }
            "refresh" => {
                self.reload()?;
                write!(output, "{}", format_invoice_table(&self.view))?;
            }

            "show" => {
                let invoice = service.get(self.target(arg)?)?;
                write!(
                    output,
                    "{}",
                    format_invoice_details(&invoice, self.view.currency_symbol())
                )?;
            }
            "toggle" => {
                let id = self.target(arg)?;
                let reimbursed = service.toggle_reimbursed(id)?;
                self.reload()?;
                writeln!(
                    output,
                    "Invoice {} is now {}",
                    id,
                    if reimbursed { "reimbursed" } else { "not reimbursed" }
                )?;
            }
            "delete" | "rm" => {
                let invoice = service.get(self.target(arg)?)?;
                return Ok(Outcome::ConfirmDelete(invoice.id));
            }

            "backup" => {
                let info = self.scheduler.backup_now()?;
                writeln!(output, "Snapshot created: {}", info.filename)?;
            }
            "status" => {
                let status = self.scheduler.status();
                writeln!(output, "Scheduler: {}", status.state)?;
                writeln!(
                    output,
                    "Last snapshot: {}",
                    status.last_snapshot.as_deref().unwrap_or("(none)")
                )?;
                writeln!(output, "Snapshots taken: {}", status.total_snapshots)?;
                if status.consecutive_failures > 0 {
                    writeln!(
                        output,
                        "Failures since last success: {}",
                        status.consecutive_failures
                    )?;
                }
                if let Some(latest) = self.scheduler.manager().get_latest_backup()? {
                    writeln!(
                        output,
                        "Newest on disk: {} ({})",
                        latest.filename,
                        latest.created_at.format(TIMESTAMP_FORMAT)
                    )?;
                }
            }

            other => {
                return Err(InvoiceError::Validation(format!(
                    "Unknown command '{}'. Type 'help' for a list of commands",
                    other
                )))
            }
        }

        Ok(Outcome::Continue)
    }

    pub fn view(&self) -> &InvoiceListView {
        &self.view
    }

    pub fn scheduler(&self) -> &BackupScheduler {
        &self.scheduler
    }

    fn delete<W: Write>(&mut self, id: i64, output: &mut W) -> InvoiceResult<()> {
        let removed = InvoiceService::new(self.storage).delete(id)?;
        self.reload()?;
        writeln!(output, "Deleted invoice {}: {}", removed.id, removed.content)?;
        Ok(())
    }

    fn reload(&mut self) -> InvoiceResult<()> {
        let rows = InvoiceService::new(self.storage).list("")?;
        self.view.refresh(rows);
        Ok(())
    }

    /// The id given on the command line, else the selected row
    fn target(&self, arg: &str) -> InvoiceResult<i64> {
        if arg.is_empty() {
            self.view.selected().ok_or_else(|| {
                InvoiceError::Validation("No invoice selected; give an id or use 'select'".into())
            })
        } else {
            parse_id(arg)
        }
    }
}

fn parse_id(arg: &str) -> InvoiceResult<i64> {
    arg.parse()
        .map_err(|_| InvoiceError::Validation(format!("Invalid invoice id: '{}'", arg)))
}

/// Run an interactive session on stdin/stdout
pub fn run_session(paths: &InvoicePaths, storage: &Storage, settings: &Settings) -> InvoiceResult<()> {
    let manager = Arc::new(BackupManager::new(paths, settings.backup.clone()));
    let scheduler = BackupScheduler::new(
        manager,
        settings.backup.interval(),
        settings.backup.error_cooldown(),
    );

    println!("Interactive session. Type 'help' for commands, 'quit' to leave.");
    let mut session = Session::new(storage, settings, scheduler);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    session.run(stdin.lock(), &mut output)
}
