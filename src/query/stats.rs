//! Aggregate statistics over the visible rows

use crate::models::{InvoiceRow, Money};

/// Count and total amount of a set of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListStats {
    pub count: usize,
    pub total: Money,
}

impl ListStats {
    pub fn from_rows(rows: &[InvoiceRow]) -> Self {
        Self {
            count: rows.len(),
            total: rows.iter().map(|r| r.amount).sum(),
        }
    }

    /// Status line, e.g. `2 invoices   Total: ¥ 150.00`
    pub fn summary(&self, currency_symbol: &str) -> String {
        let noun = if self.count == 1 { "invoice" } else { "invoices" };
        format!(
            "{} {}   Total: {}",
            self.count,
            noun,
            self.total.format_with_symbol(currency_symbol)
        )
    }
}
