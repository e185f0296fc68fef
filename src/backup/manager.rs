//! Backup manager for invoice-cli
//!
//! Creates point-in-time snapshots of the record store and keeps only the
//! most recent ones. Snapshots are full SQLite files named
//! `{prefix}YYYYMMDD_HHMMSS.db`, with a zero-padded `_NNN` suffix when
//! several are taken within the same second, so filename order is
//! creation order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rusqlite::backup::{Backup, StepResult};
use rusqlite::Connection;

use crate::config::paths::InvoicePaths;
use crate::config::settings::BackupSettings;
use crate::error::{InvoiceError, InvoiceResult};
use crate::storage::Database;

/// Timestamp layout embedded in snapshot names
const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const SNAPSHOT_EXTENSION: &str = "db";

/// Pause before retrying a copy step that found the store locked
const COPY_RETRY_PAUSE: Duration = Duration::from_millis(50);

/// Locked copy attempts before giving up (about ten seconds)
const COPY_MAX_ATTEMPTS: u32 = 200;

/// Digits in the same-second sequence suffix
const SEQUENCE_WIDTH: usize = 3;

/// Metadata about a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// Snapshot filename
    pub filename: String,
    /// Full path to the snapshot
    pub path: PathBuf,
    /// Timestamp embedded in the name (local time)
    pub created_at: NaiveDateTime,
    /// Same-second disambiguation counter, 0 for the unsuffixed name
    pub sequence: u32,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages snapshot creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    database: Database,
    settings: BackupSettings,
    /// Serializes snapshot writers so two callers never pick the same name
    write_lock: Mutex<()>,
}

impl BackupManager {
    /// Create a new BackupManager for the store and backup directory in `paths`
    pub fn new(paths: &InvoicePaths, settings: BackupSettings) -> Self {
        Self::with_database(Database::new(paths.database_file()), paths.backup_dir(), settings)
    }

    pub fn with_database(database: Database, backup_dir: PathBuf, settings: BackupSettings) -> Self {
        Self {
            backup_dir,
            database,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    /// Take a snapshot of the record store, then enforce retention
    ///
    /// Retention is cleanup after a snapshot that already succeeded, so a
    /// failure there is logged and the snapshot is still returned.
    pub fn create_backup(&self) -> InvoiceResult<BackupInfo> {
        let info = self.snapshot()?;
        Ok(settle_retention(info, self.enforce_retention()))
    }

    /// Take a snapshot without touching older ones
    pub fn snapshot(&self) -> InvoiceResult<BackupInfo> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.database.path().exists() {
            return Err(InvoiceError::Backup(format!(
                "Record store not found: {}",
                self.database.path().display()
            )));
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            InvoiceError::Backup(format!("Failed to create backup directory: {}", e))
        })?;

        // Settle pending writes before copying
        self.database.flush()?;

        let created_at = Local::now().naive_local();
        let sequence = self.next_sequence(created_at)?;
        let filename = self.snapshot_name(created_at, sequence);
        let path = self.backup_dir.join(&filename);
        let partial = self.backup_dir.join(format!("{}.partial", filename));

        let source = self.database.connect()?;
        let copied = Connection::open(&partial)
            .map_err(InvoiceError::from)
            .and_then(|mut dest| copy_database(&source, &mut dest));
        if let Err(e) = copied {
            let _ = fs::remove_file(&partial);
            return Err(InvoiceError::Backup(format!("Failed to copy record store: {}", e)));
        }
        drop(source);

        fs::rename(&partial, &path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            InvoiceError::Backup(format!("Failed to finalize snapshot {}: {}", filename, e))
        })?;

        let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        log::info!("Created snapshot {} ({} bytes)", filename, size_bytes);

        Ok(BackupInfo {
            filename,
            path,
            created_at,
            sequence,
            size_bytes,
        })
    }

    /// List all snapshots, oldest first
    pub fn list_backups(&self) -> InvoiceResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            InvoiceError::Io(format!("Failed to read backup directory: {}", e))
        })? {
            let entry = entry
                .map_err(|e| InvoiceError::Io(format!("Failed to read directory entry: {}", e)))?;

            if let Some(info) = self.parse_backup_info(&entry.path()) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| {
            (a.created_at, a.sequence).cmp(&(b.created_at, b.sequence))
        });

        Ok(backups)
    }

    /// Delete the oldest snapshots until at most `retention` remain
    ///
    /// A snapshot that cannot be deleted is logged and skipped. Returns the
    /// paths that were actually removed.
    pub fn enforce_retention(&self) -> InvoiceResult<Vec<PathBuf>> {
        let backups = self.list_backups()?;
        let excess = backups.len().saturating_sub(self.settings.retention);
        let mut deleted = Vec::new();

        for backup in backups.into_iter().take(excess) {
            match fs::remove_file(&backup.path) {
                Ok(()) => {
                    log::info!("Removed old snapshot {}", backup.filename);
                    deleted.push(backup.path);
                }
                Err(e) => {
                    log::warn!("Failed to remove old snapshot {}: {}", backup.filename, e);
                }
            }
        }

        Ok(deleted)
    }

    /// Get a specific snapshot by filename
    pub fn get_backup(&self, filename: &str) -> InvoiceResult<Option<BackupInfo>> {
        if filename.contains(['/', '\\']) {
            return Ok(None);
        }
        let path = self.backup_dir.join(filename);
        if path.exists() {
            Ok(self.parse_backup_info(&path))
        } else {
            Ok(None)
        }
    }

    /// Get the most recent snapshot
    pub fn get_latest_backup(&self) -> InvoiceResult<Option<BackupInfo>> {
        let backups = self.list_backups()?;
        Ok(backups.into_iter().last())
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn settings(&self) -> &BackupSettings {
        &self.settings
    }

    fn snapshot_name(&self, created_at: NaiveDateTime, sequence: u32) -> String {
        let stamp = created_at.format(NAME_TIMESTAMP_FORMAT);
        if sequence == 0 {
            format!("{}{}.{}", self.settings.file_prefix, stamp, SNAPSHOT_EXTENSION)
        } else {
            format!(
                "{}{}_{:0width$}.{}",
                self.settings.file_prefix,
                stamp,
                sequence,
                SNAPSHOT_EXTENSION,
                width = SEQUENCE_WIDTH
            )
        }
    }

    /// One past the highest sequence already used for this second
    ///
    /// Gaps left by retention are never reused, so a new snapshot always
    /// sorts after every existing one.
    fn next_sequence(&self, created_at: NaiveDateTime) -> InvoiceResult<u32> {
        let second = created_at.format(NAME_TIMESTAMP_FORMAT).to_string();
        let latest = self
            .list_backups()?
            .into_iter()
            .filter(|b| b.created_at.format(NAME_TIMESTAMP_FORMAT).to_string() == second)
            .map(|b| b.sequence)
            .max();

        Ok(latest.map_or(0, |n| n + 1))
    }

    fn parse_backup_info(&self, path: &Path) -> Option<BackupInfo> {
        let filename = path.file_name()?.to_str()?.to_string();
        let (created_at, sequence) = parse_snapshot_name(&self.settings.file_prefix, &filename)?;
        let size_bytes = fs::metadata(path).ok()?.len();

        Some(BackupInfo {
            filename,
            path: path.to_path_buf(),
            created_at,
            sequence,
            size_bytes,
        })
    }
}

/// Copy every page of `source` into `dest` with SQLite's online backup API
///
/// Every page is copied in one step, so the copy reflects one committed
/// state of the source. A busy or locked source is retried after a short
/// pause, up to `COPY_MAX_ATTEMPTS` times.
pub(crate) fn copy_database(source: &Connection, dest: &mut Connection) -> InvoiceResult<()> {
    let backup = Backup::new(source, dest)?;

    for _ in 0..COPY_MAX_ATTEMPTS {
        match backup.step(-1)? {
            StepResult::Done => return Ok(()),
            StepResult::More => continue,
            _ => std::thread::sleep(COPY_RETRY_PAUSE),
        }
    }

    Err(InvoiceError::Database(format!(
        "Record store stayed locked for {} copy attempts",
        COPY_MAX_ATTEMPTS
    )))
}

/// The snapshot stands whatever retention reports
fn settle_retention(info: BackupInfo, retention: InvoiceResult<Vec<PathBuf>>) -> BackupInfo {
    if let Err(e) = retention {
        log::warn!("Snapshot {} kept, but retention failed: {}", info.filename, e);
    }
    info
}

/// Parse `{prefix}YYYYMMDD_HHMMSS[_NNN].db` into its timestamp and sequence
///
/// Any number of suffix digits is accepted, padded or not.
fn parse_snapshot_name(prefix: &str, filename: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = filename
        .strip_prefix(prefix)?
        .strip_suffix(SNAPSHOT_EXTENSION)?
        .strip_suffix('.')?;

    // YYYYMMDD_HHMMSS is 15 bytes of ASCII
    let stamp = stem.get(..15)?;
    let created_at = NaiveDateTime::parse_from_str(stamp, NAME_TIMESTAMP_FORMAT).ok()?;

    let sequence = match &stem[15..] {
        "" => 0,
        rest => {
            let digits = rest.strip_prefix('_')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        }
    };

    Some((created_at, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseType, Money, NewInvoice};
    use crate::storage::{database::has_invoice_table, InvoiceRepository};
    use chrono::{Datelike, Timelike};
    use rusqlite::{Connection, OpenFlags};
    use tempfile::TempDir;

    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        Database::new(paths.database_file()).initialize().unwrap();

        let manager = BackupManager::new(&paths, BackupSettings::default());
        (manager, temp_dir)
    }

    fn count_invoices(path: &Path) -> i64 {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        assert!(has_invoice_table(&conn).unwrap());
        conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_backup() {
        let (manager, _temp) = create_test_manager();
        let repo = InvoiceRepository::new(manager.database().clone());
        repo.insert(&NewInvoice::new("Taxi", ExpenseType::Advanced, Money::from_cents(3500)))
            .unwrap();

        let info = manager.create_backup().unwrap();

        assert!(info.path.exists());
        assert!(info.filename.starts_with("invoices_backup_"));
        assert!(info.filename.ends_with(".db"));
        assert!(info.size_bytes > 0);
        assert_eq!(count_invoices(&info.path), 1);
    }

    #[test]
    fn test_create_backup_without_store_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        let manager = BackupManager::new(&paths, BackupSettings::default());

        assert!(matches!(manager.create_backup(), Err(InvoiceError::Backup(_))));
        assert!(!paths.database_file().exists());
    }

    #[test]
    fn test_burst_never_overwrites() {
        let (manager, _temp) = create_test_manager();

        let infos: Vec<BackupInfo> = (0..3).map(|_| manager.create_backup().unwrap()).collect();

        let mut names: Vec<&str> = infos.iter().map(|b| b.filename.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert!(infos.iter().all(|b| b.path.exists()));
    }

    #[test]
    fn test_list_backups_oldest_first() {
        let (manager, _temp) = create_test_manager();

        let first = manager.create_backup().unwrap();
        let second = manager.create_backup().unwrap();
        fs::write(manager.backup_dir().join("notes.txt"), "ignored").unwrap();
        fs::write(manager.backup_dir().join("invoices_backup_garbage.db"), "x").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].path, first.path);
        assert_eq!(backups[1].path, second.path);
    }

    #[test]
    fn test_retention_keeps_newest_five() {
        let (manager, _temp) = create_test_manager();

        let created: Vec<PathBuf> = (0..7)
            .map(|_| manager.create_backup().unwrap().path)
            .collect();

        let remaining: Vec<PathBuf> = manager
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.path)
            .collect();

        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining, created[2..].to_vec());
        assert!(!created[0].exists());
        assert!(!created[1].exists());
    }

    #[test]
    fn test_retention_swallows_delete_failures() {
        let (manager, _temp) = create_test_manager();

        // A directory with a snapshot name cannot be removed with remove_file
        let stuck = manager
            .backup_dir()
            .join("invoices_backup_20000101_000000.db");
        fs::create_dir_all(&stuck).unwrap();

        for _ in 0..5 {
            manager.snapshot().unwrap();
        }

        let deleted = manager.enforce_retention().unwrap();
        assert!(deleted.is_empty());
        assert!(stuck.exists());

        // The next snapshot still succeeds and prunes the oldest real one
        manager.create_backup().unwrap();
        assert_eq!(manager.list_backups().unwrap().len(), 6);
    }

    #[test]
    fn test_snapshot_valid_under_concurrent_writes() {
        let (manager, _temp) = create_test_manager();
        let repo = InvoiceRepository::new(manager.database().clone());

        let writer = std::thread::spawn(move || {
            for i in 0..200 {
                let invoice = NewInvoice::new(
                    format!("Item {}", i),
                    ExpenseType::SelfPaid,
                    Money::from_cents(100 + i),
                );
                repo.insert(&invoice).unwrap();
            }
        });

        let mut snapshots = Vec::new();
        for _ in 0..3 {
            snapshots.push(manager.snapshot().unwrap());
        }
        writer.join().unwrap();

        for info in snapshots {
            let count = count_invoices(&info.path);
            assert!((0..=200).contains(&count));
        }
    }

    #[test]
    fn test_get_latest_and_get_backup() {
        let (manager, _temp) = create_test_manager();

        assert!(manager.get_latest_backup().unwrap().is_none());

        manager.create_backup().unwrap();
        let newest = manager.create_backup().unwrap();

        let latest = manager.get_latest_backup().unwrap().unwrap();
        assert_eq!(latest.path, newest.path);

        let found = manager.get_backup(&newest.filename).unwrap().unwrap();
        assert_eq!(found.filename, newest.filename);
        assert!(manager.get_backup("missing.db").unwrap().is_none());
        assert!(manager.get_backup("../data/invoices.db").unwrap().is_none());
    }

    #[test]
    fn test_parse_snapshot_name() {
        let prefix = "invoices_backup_";

        let (ts, seq) = parse_snapshot_name(prefix, "invoices_backup_20251127_143022.db").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 11, 27));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 30, 22));
        assert_eq!(seq, 0);

        let (_, seq) = parse_snapshot_name(prefix, "invoices_backup_20251127_143022_012.db").unwrap();
        assert_eq!(seq, 12);
        let (_, seq) = parse_snapshot_name(prefix, "invoices_backup_20251127_143022_7.db").unwrap();
        assert_eq!(seq, 7);

        assert!(parse_snapshot_name(prefix, "invoices_backup_20251127_143022_.db").is_none());
        assert!(parse_snapshot_name(prefix, "invoices_backup_20251127_143022.db.partial").is_none());
        assert!(parse_snapshot_name(prefix, "other_20251127_143022.db").is_none());
        assert!(parse_snapshot_name(prefix, "invoices_backup_20251327_143022.db").is_none());
    }

    #[test]
    fn test_sequence_orders_after_unsuffixed() {
        let prefix = "invoices_backup_";
        let (a_ts, a_seq) = parse_snapshot_name(prefix, "invoices_backup_20250101_000000.db").unwrap();
        let (b_ts, b_seq) =
            parse_snapshot_name(prefix, "invoices_backup_20250101_000000_010.db").unwrap();
        let (c_ts, c_seq) =
            parse_snapshot_name(prefix, "invoices_backup_20250101_000000_002.db").unwrap();

        assert!((a_ts, a_seq) < (c_ts, c_seq));
        assert!((c_ts, c_seq) < (b_ts, b_seq));
    }

    #[test]
    fn test_snapshot_name_pads_sequence() {
        let (manager, _temp) = create_test_manager();
        let ts = NaiveDateTime::parse_from_str("20250101_000000", NAME_TIMESTAMP_FORMAT).unwrap();

        assert_eq!(manager.snapshot_name(ts, 0), "invoices_backup_20250101_000000.db");
        assert_eq!(manager.snapshot_name(ts, 2), "invoices_backup_20250101_000000_002.db");

        let mut names: Vec<String> = [10, 0, 2, 1]
            .iter()
            .map(|n| manager.snapshot_name(ts, *n))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "invoices_backup_20250101_000000.db",
                "invoices_backup_20250101_000000_001.db",
                "invoices_backup_20250101_000000_002.db",
                "invoices_backup_20250101_000000_010.db",
            ]
        );
    }

    #[test]
    fn test_filename_order_matches_creation_order() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        Database::new(paths.database_file()).initialize().unwrap();
        let settings = BackupSettings {
            retention: 100,
            ..BackupSettings::default()
        };
        let manager = BackupManager::new(&paths, settings);

        let created: Vec<String> = (0..12)
            .map(|_| manager.create_backup().unwrap().filename)
            .collect();

        let mut on_disk: Vec<String> = fs::read_dir(manager.backup_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        on_disk.sort();

        let listed: Vec<String> = manager
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.filename)
            .collect();

        assert_eq!(on_disk, created);
        assert_eq!(listed, created);
    }

    #[test]
    fn test_copy_database_copies_every_row() {
        let (manager, _temp) = create_test_manager();
        let repo = InvoiceRepository::new(manager.database().clone());
        for cents in [100, 200, 300] {
            repo.insert(&NewInvoice::new("Pens", ExpenseType::Advanced, Money::from_cents(cents)))
                .unwrap();
        }

        let source = manager.database().connect().unwrap();
        let mut dest = Connection::open_in_memory().unwrap();
        copy_database(&source, &mut dest).unwrap();

        let count: i64 = dest
            .query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_retention_failure_keeps_snapshot() {
        let (manager, _temp) = create_test_manager();
        let info = manager.snapshot().unwrap();

        let kept = settle_retention(
            info.clone(),
            Err(InvoiceError::Io("Failed to read backup directory".into())),
        );

        assert_eq!(kept, info);
        assert!(kept.path.exists());
    }
}
