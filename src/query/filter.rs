//! Search-term filtering
//!
//! A record matches when the lower-cased term is a substring of its
//! lower-cased content, platform or expense type. The expense type matches
//! on both its code (`self-paid`) and its label (`自费`). Absent fields
//! match as the empty string.

use crate::models::{ExpenseType, Invoice, InvoiceRow};

/// Records that can be matched against a search term
pub trait Searchable {
    fn content(&self) -> &str;
    fn platform(&self) -> Option<&str>;
    fn expense_type(&self) -> ExpenseType;
}

impl Searchable for InvoiceRow {
    fn content(&self) -> &str {
        &self.content
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    fn expense_type(&self) -> ExpenseType {
        self.expense_type
    }
}

impl Searchable for Invoice {
    fn content(&self) -> &str {
        &self.content
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    fn expense_type(&self) -> ExpenseType {
        self.expense_type
    }
}

/// Normalize a user-entered term: trimmed and lower-cased
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Check one record against an already normalized term
pub fn matches<T: Searchable>(record: &T, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    record.content().to_lowercase().contains(needle)
        || record
            .platform()
            .unwrap_or("")
            .to_lowercase()
            .contains(needle)
        || record.expense_type().as_str().contains(needle)
        || record.expense_type().label().contains(needle)
}

/// Keep the records matching `term`, preserving their order
///
/// An empty (or all-whitespace) term returns every record.
pub fn filter<T: Searchable + Clone>(records: &[T], term: &str) -> Vec<T> {
    let needle = normalize_term(term);
    records
        .iter()
        .filter(|record| matches(*record, &needle))
        .cloned()
        .collect()
}
