//! Core data models for invoice-cli
//!
//! This module contains the data structures of the reimbursement domain:
//! invoices, their list projection, expense types and money amounts.

pub mod invoice;
pub mod money;

pub use invoice::{ExpenseType, Invoice, InvoiceRow, NewInvoice, TIMESTAMP_FORMAT};
pub use money::{Money, MoneyParseError};
