//! List query and sort engine
//!
//! Turns a search term plus a sort column into the ordered rows the host
//! displays, and computes the count/total shown in the status line.
//!
//! - `filter`: case-insensitive substring search over content, platform
//!   and expense type
//! - `sort`: per-column toggled sorting with numeric, currency and text
//!   comparators
//! - `stats`: aggregate figures over the filtered rows
//! - `view`: the list state that ties the three together

pub mod filter;
pub mod sort;
pub mod stats;
pub mod view;

pub use filter::{filter, Searchable};
pub use sort::{sort_rows, Column, ColumnKind, SortDirection, SortState};
pub use stats::ListStats;
pub use view::InvoiceListView;
