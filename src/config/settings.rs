//! User settings for invoice-cli
//!
//! Manages user preferences including the backup schedule, snapshot
//! retention, display currency and log level.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::InvoicePaths;
use crate::error::InvoiceError;

/// One week, the normal distance between scheduled snapshots
pub const DEFAULT_BACKUP_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Wait after a failed scheduled snapshot before trying again
pub const DEFAULT_ERROR_COOLDOWN_SECS: u64 = 60;

/// Number of snapshots kept after each successful backup
pub const DEFAULT_RETENTION: usize = 5;

/// Backup schedule and retention settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Seconds between scheduled snapshots
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds to wait after a failed scheduled snapshot
    #[serde(default = "default_error_cooldown_secs")]
    pub error_cooldown_secs: u64,

    /// Number of most recent snapshots to keep
    #[serde(default = "default_retention")]
    pub retention: usize,

    /// Snapshot file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl BackupSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            error_cooldown_secs: default_error_cooldown_secs(),
            retention: default_retention(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_BACKUP_INTERVAL_SECS
}

fn default_error_cooldown_secs() -> u64 {
    DEFAULT_ERROR_COOLDOWN_SECS
}

fn default_retention() -> usize {
    DEFAULT_RETENTION
}

fn default_file_prefix() -> String {
    "invoices_backup_".to_string()
}

/// User settings for invoice-cli
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for the settings file
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when rendering amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Default log filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Backup schedule and retention
    #[serde(default)]
    pub backup: BackupSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "¥".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            log_level: default_log_level(),
            backup: BackupSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &InvoicePaths) -> Result<Self, InvoiceError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                InvoiceError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                InvoiceError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &InvoicePaths) -> Result<(), InvoiceError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            InvoiceError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            InvoiceError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject settings the scheduler cannot run with
    fn validate(&self) -> Result<(), InvoiceError> {
        if self.backup.retention == 0 {
            return Err(InvoiceError::Config(
                "backup.retention must keep at least one snapshot".into(),
            ));
        }
        if self.backup.interval_secs == 0 {
            return Err(InvoiceError::Config(
                "backup.interval_secs must be greater than zero".into(),
            ));
        }
        if self.backup.file_prefix.is_empty() {
            return Err(InvoiceError::Config("backup.file_prefix must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.currency_symbol, "¥");
        assert_eq!(settings.backup.interval(), Duration::from_secs(604_800));
        assert_eq!(settings.backup.error_cooldown(), Duration::from_secs(60));
        assert_eq!(settings.backup.retention, 5);
        assert_eq!(settings.backup.file_prefix, "invoices_backup_");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.currency_symbol = "$".into();
        settings.backup.retention = 3;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.currency_symbol, "$");
        assert_eq!(loaded.backup.retention, 3);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"backup": {"retention": 2}}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup.retention, 2);
        assert_eq!(loaded.backup.interval_secs, DEFAULT_BACKUP_INTERVAL_SECS);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_zero_retention_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InvoicePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"backup": {"retention": 0}}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, InvoiceError::Config(_)));
    }
}
