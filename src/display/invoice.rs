//! Invoice display formatting
//!
//! Renders the list view as a table and a single invoice as a details block.

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::models::{Invoice, TIMESTAMP_FORMAT};
use crate::query::sort::reimbursed_label;
use crate::query::{Column, InvoiceListView};

/// Marker shown in front of the selected row
const SELECTED_MARKER: &str = ">";

/// Format the visible rows of a list view, with the summary line below
///
/// The active sort column's header carries the direction arrow.
pub fn format_invoice_table(view: &InvoiceListView) -> String {
    if view.rows().is_empty() {
        let mut output = "No invoices found.\n".to_string();
        if !view.search().is_empty() {
            output.push_str(&format!("Search: \"{}\"\n", view.search()));
        }
        return output;
    }

    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(Column::ALL.iter().map(|column| match view.active_sort() {
        Some((active, direction)) if active == *column => {
            format!("{} {}", column.title(), direction.arrow())
        }
        _ => column.title().to_string(),
    }));
    builder.push_record(header);

    for row in view.rows() {
        let marker = if view.selected() == Some(row.id) {
            SELECTED_MARKER
        } else {
            ""
        };

        let mut record = vec![marker.to_string()];
        record.extend(
            Column::ALL
                .iter()
                .map(|column| column.cell(row, view.currency_symbol())),
        );
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::psql());

    let mut output = table.to_string();
    output.push('\n');
    output.push_str(&format_status_line(view));
    output.push('\n');
    output
}

/// `N invoices   Total: ¥ X`, plus the search term when one is active
pub fn format_status_line(view: &InvoiceListView) -> String {
    let summary = view.stats().summary(view.currency_symbol());
    if view.search().is_empty() {
        summary
    } else {
        format!("{}   (search: \"{}\")", summary, view.search())
    }
}

/// Format invoice details for display
pub fn format_invoice_details(invoice: &Invoice, currency_symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice:     {}\n", invoice.id));
    output.push_str(&format!("Content:     {}\n", invoice.content));

    if let Some(platform) = &invoice.platform {
        output.push_str(&format!("Platform:    {}\n", platform));
    }

    output.push_str(&format!("Type:        {}\n", invoice.expense_type));
    output.push_str(&format!(
        "Amount:      {}\n",
        invoice.amount.format_with_symbol(currency_symbol)
    ));
    output.push_str(&format!(
        "Reimbursed:  {}\n",
        reimbursed_label(invoice.reimbursed)
    ));
    output.push_str(&format!(
        "Created:     {}\n",
        invoice.created_at.format(TIMESTAMP_FORMAT)
    ));

    match &invoice.pdf_path {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (missing)" };
            output.push_str(&format!("Attachment:  {}{}\n", path.display(), marker));
        }
        None => output.push_str("Attachment:  (none)\n"),
    }

    if let Some(note) = &invoice.note {
        output.push_str(&format!("Note:        {}\n", note));
    }

    output
}
