//! Invoice status values, amount computation, numbering format and guards.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::{tax_on, validate_amount, validate_tax_rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_PAID: &str = "paid";
pub const STATUS_OVERDUE: &str = "overdue";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_SENT,
    STATUS_PAID,
    STATUS_OVERDUE,
    STATUS_CANCELLED,
];

/// Statuses that count toward the overdue listing once the due date passes.
pub const COLLECTIBLE_STATUSES: &[&str] = &[STATUS_SENT, STATUS_OVERDUE];

/// Consumption tax rate applied when none is configured, in percent.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::TEN;

/// Days between issue date and due date when none is supplied.
pub const DEFAULT_PAYMENT_TERM_DAYS: i64 = 30;

pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Maximum length of the bill-to company name.
pub const MAX_CLIENT_COMPANY_LENGTH: usize = 255;

/// Maximum length of the bill-to contact person.
pub const MAX_CLIENT_CONTACT_LENGTH: usize = 255;

/// Maximum length of postal addresses on either side.
pub const MAX_ADDRESS_LENGTH: usize = 1000;

/// Maximum length of the payment method note, e.g. "bank transfer".
pub const MAX_PAYMENT_METHOD_LENGTH: usize = 50;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_SENT => Ok(Self::Sent),
            STATUS_PAID => Ok(Self::Paid),
            STATUS_OVERDUE => Ok(Self::Overdue),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            _ => Err(CoreError::InvalidStatus(format!(
                "'{s}' is not an invoice status. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Sent => STATUS_SENT,
            Self::Paid => STATUS_PAID,
            Self::Overdue => STATUS_OVERDUE,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Paid => "Paid",
            Self::Overdue => "Past due",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Paid and cancelled invoices are closed and never overdue.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

/// Unsettled invoice whose due date has passed.
pub fn is_overdue(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
    !status.is_closed() && due_date < today
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Paid invoices are settled and cannot be deleted.
pub fn ensure_deletable(status: InvoiceStatus) -> Result<(), CoreError> {
    if status == InvoiceStatus::Paid {
        return Err(CoreError::PermissionDenied(
            "paid invoices cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

/// Subtotal and tax rate of a paid invoice are frozen.
pub fn ensure_amounts_mutable(status: InvoiceStatus) -> Result<(), CoreError> {
    if status == InvoiceStatus::Paid {
        return Err(CoreError::PermissionDenied(
            "amounts on a paid invoice cannot be changed".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_due_date(issue_date: NaiveDate, due_date: NaiveDate) -> Result<(), CoreError> {
    if due_date < issue_date {
        return Err(CoreError::Validation(
            "due_date cannot be earlier than invoice_date".to_string(),
        ));
    }
    Ok(())
}

pub fn default_due_date(issue_date: NaiveDate, term_days: i64) -> NaiveDate {
    issue_date + Duration::days(term_days)
}

/// Payment date to store for `status`: marking an invoice paid without a
/// payment date records `today`.
pub fn resolve_payment_date(
    status: InvoiceStatus,
    payment_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match (status, payment_date) {
        (InvoiceStatus::Paid, None) => Some(today),
        (_, date) => date,
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// The four monetary columns of an invoice, always mutually consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceAmounts {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceAmounts {
    /// Validate inputs and derive `tax_amount = round(subtotal * rate / 100, 2)`
    /// and `total_amount = subtotal + tax_amount`.
    pub fn compute(subtotal: Decimal, tax_rate: Decimal) -> Result<Self, CoreError> {
        let subtotal = validate_amount("subtotal", subtotal)?;
        let tax_rate = validate_tax_rate(tax_rate)?;
        let tax_amount = tax_on(subtotal, tax_rate);
        Ok(Self {
            subtotal,
            tax_rate,
            tax_amount,
            total_amount: subtotal + tax_amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

/// `YYYYMM` key that scopes the numbering sequence.
pub fn year_month_key(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// `INV-YYYYMM-` prefix shared by every number issued in that month.
pub fn number_prefix(year_month: &str) -> String {
    format!("{INVOICE_NUMBER_PREFIX}-{year_month}-")
}

/// `INV-YYYYMM-NNN`. The sequence is zero-padded to three digits and widens
/// past 999 rather than wrapping.
pub fn format_invoice_number(year_month: &str, sequence: i64) -> String {
    format!("{}{sequence:03}", number_prefix(year_month))
}

/// Split a well-formed invoice number into its month key and sequence.
pub fn parse_invoice_number(number: &str) -> Option<(String, i64)> {
    let rest = number.strip_prefix(INVOICE_NUMBER_PREFIX)?.strip_prefix('-')?;
    let (year_month, sequence) = rest.split_once('-')?;
    if year_month.len() != 6 || !year_month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if sequence.len() < 3 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sequence = sequence.parse::<i64>().ok().filter(|s| *s > 0)?;
    Some((year_month.to_string(), sequence))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
