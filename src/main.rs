use anyhow::Result;
use clap::{Parser, Subcommand};

use invoice_cli::cli::{
    handle_backup_command, handle_export_command, handle_invoice_command, run_session,
};
use invoice_cli::config::{paths::InvoicePaths, settings::Settings};
use invoice_cli::logging;
use invoice_cli::storage::Storage;

#[derive(Parser)]
#[command(
    name = "invoice",
    version,
    about = "Terminal-based reimbursement invoice tracker",
    long_about = "invoice-cli keeps track of purchase invoices awaiting \
                  reimbursement. Each record can carry a PDF receipt, and the \
                  store is snapshotted on a schedule so nothing is lost."
)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Invoice(invoice_cli::cli::InvoiceCommands),

    /// Snapshot management commands
    #[command(subcommand)]
    Backup(invoice_cli::cli::BackupCommands),

    /// Export invoices
    #[command(subcommand)]
    Export(invoice_cli::cli::ExportCommands),

    /// Interactive session with background backups
    #[command(alias = "ui")]
    Session,

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = InvoicePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    logging::init(cli.log_level.as_deref().unwrap_or(&settings.log_level));

    // Initialize storage
    let storage = Storage::new(paths.clone())?;

    match cli.command {
        Some(Commands::Invoice(cmd)) => {
            handle_invoice_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Export(cmd)) => {
            handle_export_command(&storage, cmd)?;
        }
        Some(Commands::Session) => {
            run_session(&paths, &storage, &settings)?;
        }
        Some(Commands::Init) => {
            println!("Initializing invoice-cli at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Record store:  {}", paths.database_file().display());
            println!("Attachments:   {}", paths.attachment_dir().display());
            println!("Snapshots:     {}", paths.backup_dir().display());
            println!();
            println!("Run 'invoice add <content> <amount>' to record an invoice.");
        }
        Some(Commands::Config) => {
            println!("invoice-cli Configuration");
            println!("=========================");
            println!("Base directory:       {}", paths.base_dir().display());
            println!("Record store:         {}", paths.database_file().display());
            println!("Attachment directory: {}", paths.attachment_dir().display());
            println!("Backup directory:     {}", paths.backup_dir().display());
            println!("Settings file:        {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:  {}", settings.currency_symbol);
            println!("  Log level:        {}", settings.log_level);
            println!("  Backup interval:  {}s", settings.backup.interval_secs);
            println!("  Error cooldown:   {}s", settings.backup.error_cooldown_secs);
            println!("  Snapshots kept:   {}", settings.backup.retention);
        }
        None => {
            println!("invoice-cli - Reimbursement invoice tracker");
            println!();
            println!("Run 'invoice --help' for usage information.");
            println!("Run 'invoice session' to start an interactive session.");
        }
    }

    Ok(())
}
