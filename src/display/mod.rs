//! Display formatting for terminal output
//!
//! Provides utilities for formatting invoices and the list view for
//! terminal display.

pub mod invoice;

pub use invoice::{format_invoice_details, format_invoice_table, format_status_line};
