//! Invoice model
//!
//! The single persisted entity: a reimbursement invoice with an optional
//! owned PDF attachment.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::money::Money;
use crate::error::InvoiceError;

/// Storage format of `created_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who carried the expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExpenseType {
    /// Paid up front on someone else's behalf
    #[default]
    Advanced,
    /// Paid out of pocket
    SelfPaid,
}

impl ExpenseType {
    /// The text stored in the record store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advanced => "advanced",
            Self::SelfPaid => "self-paid",
        }
    }

    /// The Chinese label used on reimbursement forms
    pub fn label(&self) -> &'static str {
        match self {
            Self::Advanced => "垫付",
            Self::SelfPaid => "自费",
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseType {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "advanced" | "垫付" => Ok(Self::Advanced),
            "self-paid" | "self_paid" | "selfpaid" | "自费" => Ok(Self::SelfPaid),
            other => Err(InvoiceError::Validation(format!(
                "Unknown expense type '{}': expected 'advanced' or 'self-paid'",
                other
            ))),
        }
    }
}

/// A stored invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Store-assigned identifier
    pub id: i64,

    /// What was bought
    pub content: String,

    /// Where it was bought
    pub platform: Option<String>,

    pub expense_type: ExpenseType,

    pub amount: Money,

    pub note: Option<String>,

    /// Managed copy of the receipt, owned by this record
    pub pdf_path: Option<PathBuf>,

    pub reimbursed: bool,

    /// Set once when the record is inserted
    pub created_at: NaiveDateTime,
}

impl Invoice {
    /// Project the record onto the list row tuple
    pub fn to_row(&self) -> InvoiceRow {
        InvoiceRow {
            id: self.id,
            content: self.content.clone(),
            platform: self.platform.clone(),
            expense_type: self.expense_type,
            amount: self.amount,
            reimbursed: self.reimbursed,
            created_at: self.created_at,
        }
    }

    /// Field values for an edit that starts from the current record
    pub fn to_new(&self) -> NewInvoice {
        NewInvoice {
            content: self.content.clone(),
            platform: self.platform.clone(),
            expense_type: self.expense_type,
            amount: self.amount,
            note: self.note.clone(),
            pdf_path: self.pdf_path.clone(),
            reimbursed: self.reimbursed,
        }
    }
}

/// Invoice fields without the store-assigned `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub content: String,
    pub platform: Option<String>,
    pub expense_type: ExpenseType,
    pub amount: Money,
    pub note: Option<String>,
    pub pdf_path: Option<PathBuf>,
    pub reimbursed: bool,
}

impl NewInvoice {
    /// Create an invoice draft with the required fields
    pub fn new(content: impl Into<String>, expense_type: ExpenseType, amount: Money) -> Self {
        Self {
            content: content.into(),
            platform: None,
            expense_type,
            amount,
            note: None,
            pdf_path: None,
            reimbursed: false,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Trim text fields and turn blank optional fields into `None`
    pub fn normalized(mut self) -> Self {
        self.content = self.content.trim().to_string();
        self.platform = blank_to_none(self.platform);
        self.note = blank_to_none(self.note);
        self
    }

    /// Check the required fields
    pub fn validate(&self) -> Result<(), InvoiceError> {
        if self.content.trim().is_empty() {
            return Err(InvoiceError::Validation("Content is required".into()));
        }

        if !self.amount.is_positive() {
            return Err(InvoiceError::Validation(format!(
                "Amount must be greater than zero, got {}",
                self.amount
            )));
        }

        Ok(())
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The list projection of an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: i64,
    pub content: String,
    pub platform: Option<String>,
    pub expense_type: ExpenseType,
    pub amount: Money,
    pub reimbursed: bool,
    pub created_at: NaiveDateTime,
}
