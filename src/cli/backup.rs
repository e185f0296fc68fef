//! Backup CLI commands
//!
//! Implements CLI commands for snapshot management.

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use crate::backup::{BackupManager, RestoreManager};
use crate::config::paths::InvoicePaths;
use crate::config::settings::Settings;
use crate::error::{InvoiceError, InvoiceResult};
use crate::models::TIMESTAMP_FORMAT;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new snapshot
    Create,

    /// List all available snapshots
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore from a snapshot
    Restore {
        /// Snapshot filename or path (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show information about a specific snapshot
    Info {
        /// Snapshot filename or path (use 'latest' for most recent)
        backup: String,
    },

    /// Delete old snapshots beyond the retention count
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &InvoicePaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> InvoiceResult<()> {
    let manager = BackupManager::new(paths, settings.backup.clone());

    match cmd {
        BackupCommands::Create => {
            println!("Creating snapshot...");
            let info = manager.create_backup()?;
            println!("Snapshot created: {}", info.filename);
            println!("Location: {}", info.path.display());
            println!("Size: {}", format_size(info.size_bytes));
        }

        BackupCommands::List { verbose } => {
            let backups = manager.list_backups()?;

            if backups.is_empty() {
                println!("No snapshots found.");
                println!("Create one with: invoice backup create");
                return Ok(());
            }

            println!("Available Snapshots");
            println!("===================");
            println!();

            let now = Local::now().naive_local();
            for (i, backup) in backups.iter().enumerate() {
                let age = format_duration(now.signed_duration_since(backup.created_at));

                if verbose {
                    println!(
                        "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n",
                        i + 1,
                        backup.filename,
                        backup.created_at.format(TIMESTAMP_FORMAT),
                        format_size(backup.size_bytes),
                        age,
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {})",
                        i + 1,
                        backup.filename,
                        age,
                        format_size(backup.size_bytes),
                    );
                }
            }

            println!();
            println!(
                "Total: {} snapshot(s), keeping the newest {}",
                backups.len(),
                settings.backup.retention
            );
        }

        BackupCommands::Restore { backup, force } => {
            let backup_path = resolve_backup_path(&manager, &backup)?;

            let restore_manager = RestoreManager::new(&manager);
            let validation = restore_manager.validate_backup(&backup_path)?;

            println!("Snapshot Information");
            println!("====================");
            println!("File: {}", backup_path.display());
            println!("Status: {}", validation.summary());
            println!();

            if !validation.is_valid {
                return Err(InvoiceError::Backup(format!(
                    "Refusing to restore from {}",
                    backup_path.display()
                )));
            }

            if !force {
                println!("WARNING: This will overwrite ALL current invoices!");
                println!("To proceed, run again with --force flag:");
                println!("  invoice backup restore {} --force", backup);
                return Ok(());
            }

            println!("Restoring from snapshot...");
            let result = restore_manager.restore_from_file(&backup_path)?;

            if let Some(pre) = &result.pre_restore {
                println!("Pre-restore snapshot saved: {}", pre.filename);
            }
            println!("Restore complete!");
            println!("{}", result.summary());
        }

        BackupCommands::Info { backup } => {
            let backup_path = resolve_backup_path(&manager, &backup)?;

            let validation = RestoreManager::new(&manager).validate_backup(&backup_path)?;
            let metadata = std::fs::metadata(&backup_path)?;

            println!("Snapshot Details");
            println!("================");
            println!("File: {}", backup_path.display());
            println!("Size: {}", format_size(metadata.len()));

            let managed = backup_path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| manager.get_backup(name))
                .transpose()?
                .flatten();
            if let Some(info) = managed {
                println!("Created: {}", info.created_at.format(TIMESTAMP_FORMAT));
            }

            println!("Invoices: {}", validation.invoice_count);
            println!();
            println!("Status: {}", validation.summary());
        }

        BackupCommands::Prune { force } => {
            let backups = manager.list_backups()?;
            let retention = settings.backup.retention;
            let to_delete = backups.len().saturating_sub(retention);

            if to_delete == 0 {
                println!("No snapshots to prune.");
                println!("Current retention: newest {} snapshots", retention);
                println!("You have {} snapshot(s).", backups.len());
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!("Retention: newest {} snapshots", retention);
            println!("Current snapshots: {}", backups.len());
            println!("To be deleted: {}", to_delete);
            for backup in backups.iter().take(to_delete) {
                println!("  {}", backup.filename);
            }
            println!();

            if !force {
                println!("To delete old snapshots, run again with --force flag:");
                println!("  invoice backup prune --force");
                return Ok(());
            }

            let deleted = manager.enforce_retention()?;
            println!("Deleted {} snapshot(s).", deleted.len());
        }
    }

    Ok(())
}

/// Resolve a snapshot identifier to a full path
fn resolve_backup_path(manager: &BackupManager, backup: &str) -> InvoiceResult<PathBuf> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .get_latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| InvoiceError::backup_not_found("latest"));
    }

    // A filename in the backup directory
    if let Some(info) = manager.get_backup(backup)? {
        return Ok(info.path);
    }
    if let Some(info) = manager.get_backup(&format!("{}.db", backup))? {
        return Ok(info.path);
    }

    // Any other path, e.g. a copied snapshot
    let path = PathBuf::from(backup);
    if path.is_file() {
        return Ok(path);
    }

    Err(InvoiceError::backup_not_found(backup))
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    format!("{}d", hours / 24)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
