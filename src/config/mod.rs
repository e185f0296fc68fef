//! Configuration module for invoice-cli
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence
//! - Backup schedule parameters

pub mod paths;
pub mod settings;

pub use paths::InvoicePaths;
pub use settings::{BackupSettings, Settings};
