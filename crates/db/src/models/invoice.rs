//! Invoice rows and DTOs.

use chrono::NaiveDate;
use influberry_core::error::CoreError;
use influberry_core::invoice::{InvoiceAmounts, InvoiceStatus};
use influberry_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    pub user_id: DbId,
    pub engagement_id: DbId,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub display_name: Option<String>,
    pub description: String,
    pub client_company: String,
    pub client_address: Option<String>,
    pub client_contact: Option<String>,
    pub issuer_name: String,
    pub issuer_address: Option<String>,
    pub issuer_email: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    pub fn parsed_status(&self) -> Result<InvoiceStatus, CoreError> {
        InvoiceStatus::from_str_value(&self.status)
    }
}

/// Validated values for a new invoice. Status always starts as draft.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub user_id: DbId,
    pub engagement_id: DbId,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amounts: InvoiceAmounts,
    pub display_name: Option<String>,
    pub description: String,
    pub client_company: String,
    pub client_address: Option<String>,
    pub client_contact: Option<String>,
    pub issuer_name: String,
    pub issuer_address: Option<String>,
    pub issuer_email: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. When `amounts` is set all four monetary columns are
/// written together.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub amounts: Option<InvoiceAmounts>,
    pub due_date: Option<NaiveDate>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub client_company: Option<String>,
    pub client_address: Option<String>,
    pub client_contact: Option<String>,
    pub issuer_address: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
}

/// Listing filter. Limit and offset are clamped by the repository.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
