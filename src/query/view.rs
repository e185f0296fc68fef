//! List view state
//!
//! Holds the record set, the search term, the sort state and the current
//! selection for the host's list, and recomputes the visible rows and
//! statistics whenever one of them changes.

use super::filter::filter;
use super::sort::{sort_rows, Column, SortDirection, SortState};
use super::stats::ListStats;
use crate::models::InvoiceRow;

/// Application state behind the invoice list
#[derive(Debug, Clone)]
pub struct InvoiceListView {
    /// Every record, in base order (newest id first)
    records: Vec<InvoiceRow>,
    search: String,
    sort_state: SortState,
    active_sort: Option<(Column, SortDirection)>,
    visible: Vec<InvoiceRow>,
    stats: ListStats,
    selected: Option<i64>,
    currency_symbol: String,
}

impl InvoiceListView {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            search: String::new(),
            sort_state: SortState::new(),
            active_sort: None,
            visible: Vec::new(),
            stats: ListStats::default(),
            selected: None,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Replace the record set after a load or mutation
    ///
    /// Resets the sort state so the list shows the base order again.
    /// The search term and the selection, if still visible, are kept.
    pub fn refresh(&mut self, records: Vec<InvoiceRow>) {
        self.records = records;
        self.sort_state.reset();
        self.active_sort = None;
        self.recompute();
    }

    /// Change the search term, keeping the active sort
    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_string();
        self.recompute();
    }

    /// Sort by `column`, flipping its remembered direction
    pub fn sort_by(&mut self, column: Column) -> SortDirection {
        let direction = self.sort_state.toggle(column);
        self.active_sort = Some((column, direction));
        self.recompute();
        direction
    }

    /// Select a visible row; returns false if `id` is not visible
    pub fn select(&mut self, id: i64) -> bool {
        if self.visible.iter().any(|r| r.id == id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.visible
    }

    pub fn stats(&self) -> ListStats {
        self.stats
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn active_sort(&self) -> Option<(Column, SortDirection)> {
        self.active_sort
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    fn recompute(&mut self) {
        let filtered = filter(&self.records, &self.search);
        self.visible = match self.active_sort {
            Some((column, direction)) => {
                sort_rows(&filtered, column, direction, &self.currency_symbol)
            }
            None => filtered,
        };
        self.stats = ListStats::from_rows(&self.visible);

        if let Some(id) = self.selected {
            if !self.visible.iter().any(|r| r.id == id) {
                self.selected = None;
            }
        }
    }
}
