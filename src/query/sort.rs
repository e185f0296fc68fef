//! Column sorting
//!
//! Rows are compared on the text of the cell they render to, using a
//! comparator picked by the column kind:
//!
//! - `Currency` strips the currency symbol and thousands separators and
//!   compares the amount numerically. Cells that do not parse count as +∞.
//! - `Integer` parses the cell as an integer. Cells that do not parse
//!   count as +∞.
//! - `Text` compares lower-cased strings.
//!
//! Ties keep the base order, and descending is the exact reverse of
//! ascending, so repeated toggles alternate between two fixed orders.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::InvoiceError;
use crate::models::{InvoiceRow, Money, TIMESTAMP_FORMAT};

/// Sortable list columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Content,
    Platform,
    ExpenseType,
    Amount,
    Reimbursed,
    CreatedAt,
}

/// How cells of a column compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Currency,
    Text,
}

impl Column {
    /// All columns in display order
    pub const ALL: [Column; 7] = [
        Column::Id,
        Column::Content,
        Column::Platform,
        Column::ExpenseType,
        Column::Amount,
        Column::Reimbursed,
        Column::CreatedAt,
    ];

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Id => ColumnKind::Integer,
            Column::Amount => ColumnKind::Currency,
            _ => ColumnKind::Text,
        }
    }

    /// Identifier accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Content => "content",
            Column::Platform => "platform",
            Column::ExpenseType => "expense_type",
            Column::Amount => "amount",
            Column::Reimbursed => "reimbursed",
            Column::CreatedAt => "created_at",
        }
    }

    /// Table header title
    pub fn title(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Content => "Content",
            Column::Platform => "Platform",
            Column::ExpenseType => "Type",
            Column::Amount => "Amount",
            Column::Reimbursed => "Reimbursed",
            Column::CreatedAt => "Created",
        }
    }

    /// The text shown in this column for `row`
    pub fn cell(&self, row: &InvoiceRow, currency_symbol: &str) -> String {
        match self {
            Column::Id => row.id.to_string(),
            Column::Content => row.content.clone(),
            Column::Platform => row.platform.clone().unwrap_or_default(),
            Column::ExpenseType => row.expense_type.as_str().to_string(),
            Column::Amount => row.amount.format_with_symbol(currency_symbol),
            Column::Reimbursed => reimbursed_label(row.reimbursed).to_string(),
            Column::CreatedAt => row.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Text of the reimbursed cell
pub fn reimbursed_label(reimbursed: bool) -> &'static str {
    if reimbursed {
        "Yes"
    } else {
        "No"
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Column::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .or(match wanted.as_str() {
                "type" => Some(Column::ExpenseType),
                "created" | "date" => Some(Column::CreatedAt),
                _ => None,
            })
            .ok_or_else(|| {
                InvoiceError::Validation(format!(
                    "Unknown column '{}'. Expected one of: {}",
                    s,
                    Column::ALL.map(|c| c.name()).join(", ")
                ))
            })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header arrow for the active column
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Remembered direction per column
///
/// Every column starts out ascending; each `toggle` flips only the column
/// it is called for, so the first sort of a column is descending.
#[derive(Debug, Clone, Default)]
pub struct SortState {
    directions: HashMap<Column, SortDirection>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current remembered direction of `column`
    pub fn direction(&self, column: Column) -> SortDirection {
        self.directions.get(&column).copied().unwrap_or_default()
    }

    /// Flip `column` and return the direction to sort with
    pub fn toggle(&mut self, column: Column) -> SortDirection {
        let next = self.direction(column).toggled();
        self.directions.insert(column, next);
        next
    }

    /// Forget all remembered directions
    pub fn reset(&mut self) {
        self.directions.clear();
    }
}

/// Comparable key derived from a cell
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Number(i64),
    Infinite,
    Text(String),
}

/// Derive the comparison key of a cell for a column kind
pub fn sort_key(kind: ColumnKind, cell: &str) -> SortKey {
    match kind {
        ColumnKind::Integer => {
            let trimmed = cell.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                trimmed
                    .parse::<i64>()
                    .map(SortKey::Number)
                    .unwrap_or(SortKey::Infinite)
            } else {
                SortKey::Infinite
            }
        }
        ColumnKind::Currency => Money::parse(cell)
            .map(|m| SortKey::Number(m.cents()))
            .unwrap_or(SortKey::Infinite),
        ColumnKind::Text => SortKey::Text(cell.to_lowercase()),
    }
}

/// Return `rows` ordered by `column` in `direction`
pub fn sort_rows(
    rows: &[InvoiceRow],
    column: Column,
    direction: SortDirection,
    currency_symbol: &str,
) -> Vec<InvoiceRow> {
    let kind = column.kind();
    let mut keyed: Vec<(SortKey, usize, &InvoiceRow)> = rows
        .iter()
        .enumerate()
        .map(|(position, row)| (sort_key(kind, &column.cell(row, currency_symbol)), position, row))
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    if direction == SortDirection::Descending {
        keyed.reverse();
    }

    keyed.into_iter().map(|(_, _, row)| row.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseType;
    use chrono::NaiveDate;

    fn row(id: i64, content: &str, cents: i64, reimbursed: bool) -> InvoiceRow {
        InvoiceRow {
            id,
            content: content.to_string(),
            platform: None,
            expense_type: ExpenseType::Advanced,
            amount: Money::from_cents(cents),
            reimbursed,
            created_at: NaiveDate::from_ymd_opt(2024, 5, id as u32)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn ids(rows: &[InvoiceRow]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<InvoiceRow> {
        // Base order: newest id first
        vec![
            row(4, "banana", 5000, true),
            row(3, "Apple", 123450, false),
            row(2, "cherry", 5000, false),
            row(1, "apple pie", 999, true),
        ]
    }

    #[test]
    fn test_sort_key_currency_equivalence() {
        assert_eq!(
            sort_key(ColumnKind::Currency, "¥ 1,234.50"),
            sort_key(ColumnKind::Currency, "1234.5")
        );
        assert_eq!(sort_key(ColumnKind::Currency, "n/a"), SortKey::Infinite);
    }

    #[test]
    fn test_sort_key_integer() {
        assert_eq!(sort_key(ColumnKind::Integer, "42"), SortKey::Number(42));
        assert_eq!(sort_key(ColumnKind::Integer, "x1"), SortKey::Infinite);
        assert_eq!(sort_key(ColumnKind::Integer, "-3"), SortKey::Infinite);
        assert!(SortKey::Number(i64::MAX) < SortKey::Infinite);
    }

    #[test]
    fn test_sort_by_amount_numeric() {
        let sorted = sort_rows(&sample(), Column::Amount, SortDirection::Ascending, "¥");
        // 5000 ties keep the base order (4 before 2)
        assert_eq!(ids(&sorted), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_sort_by_text_case_insensitive() {
        let sorted = sort_rows(&sample(), Column::Content, SortDirection::Ascending, "¥");
        assert_eq!(ids(&sorted), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_sort_by_id() {
        let sorted = sort_rows(&sample(), Column::Id, SortDirection::Ascending, "¥");
        assert_eq!(ids(&sorted), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_descending_is_exact_reverse() {
        for column in Column::ALL {
            let asc = sort_rows(&sample(), column, SortDirection::Ascending, "¥");
            let mut desc = sort_rows(&sample(), column, SortDirection::Descending, "¥");
            desc.reverse();
            assert_eq!(asc, desc, "column {}", column);
        }
    }

    #[test]
    fn test_toggle_alternates() {
        let rows = sample();
        for column in Column::ALL {
            let mut state = SortState::new();
            let first = sort_rows(&rows, column, state.toggle(column), "¥");
            let second = sort_rows(&rows, column, state.toggle(column), "¥");
            let third = sort_rows(&rows, column, state.toggle(column), "¥");

            let mut reversed = first.clone();
            reversed.reverse();
            assert_eq!(second, reversed, "column {}", column);
            assert_eq!(third, first, "column {}", column);
        }
    }

    #[test]
    fn test_sort_state_is_per_column() {
        let mut state = SortState::new();
        assert_eq!(state.toggle(Column::Amount), SortDirection::Descending);
        assert_eq!(state.toggle(Column::Content), SortDirection::Descending);
        assert_eq!(state.toggle(Column::Amount), SortDirection::Ascending);
        assert_eq!(state.direction(Column::Content), SortDirection::Descending);

        state.reset();
        assert_eq!(state.direction(Column::Amount), SortDirection::Ascending);
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("amount".parse::<Column>().unwrap(), Column::Amount);
        assert_eq!("Expense-Type".parse::<Column>().unwrap(), Column::ExpenseType);
        assert_eq!("type".parse::<Column>().unwrap(), Column::ExpenseType);
        assert_eq!("created".parse::<Column>().unwrap(), Column::CreatedAt);
        assert!("colour".parse::<Column>().is_err());
    }
}
