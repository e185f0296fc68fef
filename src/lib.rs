//! invoice-cli - Terminal-based reimbursement invoice tracker
//!
//! This library provides the core functionality for tracking purchase
//! invoices awaiting reimbursement: a SQLite record store with managed PDF
//! attachments, a filterable and sortable list view, and a background
//! scheduler that keeps a rolling set of store snapshots.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: Logger initialization
//! - `models`: Core data models (invoices, money)
//! - `storage`: SQLite record store and attachment directory
//! - `services`: Business logic layer
//! - `query`: List filtering, sorting and statistics
//! - `backup`: Snapshot management and the backup scheduler
//! - `display`: Terminal formatting
//! - `export`: CSV and JSON export
//! - `cli`: Command handlers and the interactive session
//!
//! # Example
//!
//! ```rust,ignore
//! use invoice_cli::config::{paths::InvoicePaths, settings::Settings};
//! use invoice_cli::storage::Storage;
//!
//! let paths = InvoicePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod query;
pub mod services;
pub mod storage;

pub use error::{InvoiceError, InvoiceResult};
