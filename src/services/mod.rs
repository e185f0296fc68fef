//! Business logic layer for invoice-cli
//!
//! Services sit between the host (CLI and interactive session) and the
//! storage layer.

pub mod invoice;

pub use invoice::{AttachmentChange, InvoiceService};
