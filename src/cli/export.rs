//! CLI commands for data export
//!
//! Writes invoices as CSV or JSON to a file or to stdout.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::error::{InvoiceError, InvoiceResult};
use crate::export::{csv, json};
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export invoices to CSV
    Csv {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export invoices to JSON
    Json {
        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check that a JSON export file is readable and consistent
    Verify {
        /// JSON export to check
        file: PathBuf,
    },

    /// Show export information without writing files
    Info,
}

/// Handle export commands
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> InvoiceResult<()> {
    match cmd {
        ExportCommands::Csv { output } => {
            let count = with_output(output.as_deref(), |writer| {
                csv::export_invoices_csv(storage, writer)
            })?;
            report(count, output.as_deref());
        }
        ExportCommands::Json { output, pretty } => {
            let count = with_output(output.as_deref(), |writer| {
                json::export_invoices_json(storage, writer, pretty)
            })?;
            report(count, output.as_deref());
        }
        ExportCommands::Verify { file } => {
            let export = verify_export(&file)?;
            println!("Valid export: {}", file.display());
            println!("  Schema Version: {}", export.schema_version);
            println!("  Exported At:    {}", export.exported_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Invoices:       {}", export.metadata.invoice_count);
            println!("  Total:          {}", export.metadata.total);
        }
        ExportCommands::Info => handle_export_info(storage)?,
    }

    Ok(())
}

/// Read a JSON export back and validate it
fn verify_export(path: &Path) -> InvoiceResult<json::InvoiceExport> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        InvoiceError::Export(format!("Failed to read {}: {}", path.display(), e))
    })?;
    json::import_from_json(&contents)
}

/// Run `write` against the output file, or stdout when no path is given
fn with_output<F>(output: Option<&Path>, write: F) -> InvoiceResult<usize>
where
    F: FnOnce(&mut dyn Write) -> InvoiceResult<usize>,
{
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                InvoiceError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            let count = write(&mut writer)?;
            writer
                .flush()
                .map_err(|e| InvoiceError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
            Ok(count)
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            let count = write(&mut writer)?;
            writeln!(writer)?;
            Ok(count)
        }
    }
}

/// Confirmation goes to stderr when the export itself went to stdout
fn report(count: usize, output: Option<&Path>) {
    match output {
        Some(path) => println!("Exported {} invoices to: {}", count, path.display()),
        None => eprintln!("Exported {} invoices", count),
    }
}

/// Show export information
fn handle_export_info(storage: &Storage) -> InvoiceResult<()> {
    let export = json::InvoiceExport::from_storage(storage)?;

    println!("Export Information");
    println!("==================\n");

    println!("Schema Version: {}", export.schema_version);
    println!("App Version:    {}", export.app_version);
    println!();

    println!("Data Summary:");
    println!("  Invoices:      {}", export.metadata.invoice_count);
    println!("  Reimbursed:    {}", export.metadata.reimbursed_count);
    println!("  Total:         {}", export.metadata.total);
    println!("  Outstanding:   {}", export.metadata.outstanding);
    println!();

    if let Some(earliest) = &export.metadata.earliest_invoice {
        println!("Date Range:");
        println!("  Earliest: {}", earliest);
    }
    if let Some(latest) = &export.metadata.latest_invoice {
        println!("  Latest:   {}", latest);
    }

    println!("\nAvailable Export Formats:");
    println!("  csv  - one row per invoice");
    println!("  json - all invoices with metadata, machine-readable");

    println!("\nExamples:");
    println!("  invoice export csv --output invoices.csv");
    println!("  invoice export json --output invoices.json --pretty");

    Ok(())
}
