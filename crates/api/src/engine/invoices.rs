//! Invoice generation, numbering and lifecycle.
//!
//! Numbers are allocated from a per-month counter inside the same
//! transaction that inserts the invoice, so a rollback never burns a number
//! and two writers never receive the same one. The engagement row is locked
//! before the duplicate check, which serializes competing generations for
//! one engagement; the `uq_invoices_engagement` constraint backs that up.

use chrono::NaiveDate;
use influberry_core::engagement::{
    parse_date, validate_optional_text, validate_required_text, MAX_DESCRIPTION_LENGTH,
    MAX_DISPLAY_NAME_LENGTH, MAX_NOTES_LENGTH,
};
use influberry_core::error::CoreError;
use influberry_core::invoice::{
    self, default_due_date, ensure_amounts_mutable, format_invoice_number,
    parse_invoice_number, resolve_payment_date, validate_due_date, year_month_key,
    InvoiceAmounts, InvoiceStatus, MAX_ADDRESS_LENGTH, MAX_CLIENT_COMPANY_LENGTH,
    MAX_CLIENT_CONTACT_LENGTH, MAX_PAYMENT_METHOD_LENGTH,
};
use influberry_core::money::{decimal_from_json, validate_tax_rate};
use influberry_core::types::DbId;
use influberry_db::models::engagement::Engagement;
use influberry_db::models::invoice::{CreateInvoice, Invoice, InvoiceFilter, UpdateInvoice};
use influberry_db::models::user::User;
use influberry_db::repositories::invoice_repo::ENGAGEMENT_UNIQUE_CONSTRAINT;
use influberry_db::repositories::{EngagementRepo, InvoiceRepo, InvoiceSequenceRepo, UserRepo};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::{is_unique_violation, not_found};
use crate::config::BillingConfig;
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /invoices`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    pub engagement_id: Option<DbId>,
    #[serde(default, alias = "company_name")]
    pub client_company: String,
    #[serde(default)]
    pub subtotal: serde_json::Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tax_rate: Option<serde_json::Value>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, alias = "project_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub client_contact: Option<String>,
    #[serde(default)]
    pub issuer_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PUT /invoices/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub subtotal: Option<serde_json::Value>,
    pub tax_rate: Option<serde_json::Value>,
    pub due_date: Option<String>,
    #[serde(alias = "project_name")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "company_name")]
    pub client_company: Option<String>,
    pub client_address: Option<String>,
    pub client_contact: Option<String>,
    pub issuer_address: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<String>,
    pub payment_method: Option<String>,
}

/// Manual-creation fields after validation, before the engagement and
/// issuer are resolved.
#[derive(Debug)]
struct ManualInvoice {
    engagement_id: DbId,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    amounts: InvoiceAmounts,
    display_name: Option<String>,
    description: String,
    client_company: String,
    client_address: Option<String>,
    client_contact: Option<String>,
    issuer_address: Option<String>,
    notes: Option<String>,
}

fn parse_tax_rate(raw: &serde_json::Value) -> Result<Decimal, CoreError> {
    validate_tax_rate(decimal_from_json("tax_rate", raw)?)
}

fn validate_manual(
    input: &CreateInvoiceRequest,
    billing: &BillingConfig,
    today: NaiveDate,
) -> Result<ManualInvoice, CoreError> {
    let engagement_id = input
        .engagement_id
        .ok_or_else(|| CoreError::Validation("engagement_id is required".to_string()))?;

    let subtotal = decimal_from_json("subtotal", &input.subtotal)?;
    let tax_rate = match &input.tax_rate {
        Some(raw) => parse_tax_rate(raw)?,
        None => billing.default_tax_rate,
    };
    let amounts = InvoiceAmounts::compute(subtotal, tax_rate)?;

    let invoice_date = match input.invoice_date.as_deref() {
        Some(raw) => parse_date("invoice_date", raw)?,
        None => today,
    };
    let due_date = match input.due_date.as_deref() {
        Some(raw) => parse_date("due_date", raw)?,
        None => default_due_date(invoice_date, billing.payment_term_days),
    };
    validate_due_date(invoice_date, due_date)?;

    Ok(ManualInvoice {
        engagement_id,
        invoice_date,
        due_date,
        amounts,
        display_name: validate_optional_text(
            "display_name",
            input.display_name.as_deref(),
            MAX_DISPLAY_NAME_LENGTH,
        )?,
        description: validate_required_text(
            "description",
            &input.description,
            MAX_DESCRIPTION_LENGTH,
        )?,
        client_company: validate_required_text(
            "client_company",
            &input.client_company,
            MAX_CLIENT_COMPANY_LENGTH,
        )?,
        client_address: validate_optional_text(
            "client_address",
            input.client_address.as_deref(),
            MAX_ADDRESS_LENGTH,
        )?,
        client_contact: validate_optional_text(
            "client_contact",
            input.client_contact.as_deref(),
            MAX_CLIENT_CONTACT_LENGTH,
        )?,
        issuer_address: validate_optional_text(
            "issuer_address",
            input.issuer_address.as_deref(),
            MAX_ADDRESS_LENGTH,
        )?,
        notes: validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?,
    })
}

/// Validate an update against the invoice as it currently stands.
fn validate_update(
    current: &Invoice,
    input: &UpdateInvoiceRequest,
    today: NaiveDate,
) -> Result<UpdateInvoice, CoreError> {
    let current_status = current.parsed_status()?;
    let status = input
        .status
        .as_deref()
        .map(|s| InvoiceStatus::from_str_value(s.trim()))
        .transpose()?;

    let amounts = if input.subtotal.is_some() || input.tax_rate.is_some() {
        ensure_amounts_mutable(current_status)?;
        let subtotal = match &input.subtotal {
            Some(raw) => decimal_from_json("subtotal", raw)?,
            None => current.subtotal,
        };
        let tax_rate = match &input.tax_rate {
            Some(raw) => parse_tax_rate(raw)?,
            None => current.tax_rate,
        };
        Some(InvoiceAmounts::compute(subtotal, tax_rate)?)
    } else {
        None
    };

    let due_date = input
        .due_date
        .as_deref()
        .map(|raw| parse_date("due_date", raw))
        .transpose()?;
    if let Some(due_date) = due_date {
        validate_due_date(current.invoice_date, due_date)?;
    }

    let payment_date = input
        .payment_date
        .as_deref()
        .map(|raw| parse_date("payment_date", raw))
        .transpose()?;
    let payment_date = match status {
        Some(status) if current.payment_date.is_none() => {
            resolve_payment_date(status, payment_date, today)
        }
        _ => payment_date,
    };

    let client_company = input
        .client_company
        .as_deref()
        .map(|v| validate_required_text("client_company", v, MAX_CLIENT_COMPANY_LENGTH))
        .transpose()?;
    let description = input
        .description
        .as_deref()
        .map(|v| validate_required_text("description", v, MAX_DESCRIPTION_LENGTH))
        .transpose()?;

    Ok(UpdateInvoice {
        amounts,
        due_date,
        display_name: validate_optional_text(
            "display_name",
            input.display_name.as_deref(),
            MAX_DISPLAY_NAME_LENGTH,
        )?,
        description,
        client_company,
        client_address: validate_optional_text(
            "client_address",
            input.client_address.as_deref(),
            MAX_ADDRESS_LENGTH,
        )?,
        client_contact: validate_optional_text(
            "client_contact",
            input.client_contact.as_deref(),
            MAX_CLIENT_CONTACT_LENGTH,
        )?,
        issuer_address: validate_optional_text(
            "issuer_address",
            input.issuer_address.as_deref(),
            MAX_ADDRESS_LENGTH,
        )?,
        status: status.map(|s| s.as_str().to_string()),
        notes: validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?,
        payment_date,
        payment_method: validate_optional_text(
            "payment_method",
            input.payment_method.as_deref(),
            MAX_PAYMENT_METHOD_LENGTH,
        )?,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock the engagement and fail if it already has an invoice.
async fn lock_uninvoiced_engagement(
    tx: &mut Transaction<'static, Postgres>,
    user_id: DbId,
    engagement_id: DbId,
) -> AppResult<Engagement> {
    let engagement = EngagementRepo::lock_for_user(&mut **tx, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Engagement", engagement_id))?;

    if let Some(existing) = InvoiceRepo::find_by_engagement(&mut **tx, engagement_id).await? {
        tracing::warn!(
            user_id,
            engagement_id,
            existing_invoice_id = existing.id,
            "Invoice already exists for engagement",
        );
        return Err(CoreError::DuplicateInvoice {
            engagement_id,
            existing_invoice_id: existing.id,
        }
        .into());
    }
    Ok(engagement)
}

async fn load_issuer(tx: &mut Transaction<'static, Postgres>, user_id: DbId) -> AppResult<User> {
    UserRepo::find_active(&mut **tx, user_id)
        .await?
        .ok_or_else(|| not_found("User", user_id))
}

/// Allocate the next number in the month of `issue_date`.
async fn allocate_number(
    tx: &mut Transaction<'static, Postgres>,
    issue_date: NaiveDate,
) -> AppResult<String> {
    let year_month = year_month_key(issue_date);
    let sequence = InvoiceSequenceRepo::next_value(&mut **tx, &year_month).await?;
    Ok(format_invoice_number(&year_month, sequence))
}

/// Insert and commit. A concurrent insert that won the engagement's unique
/// constraint is reported as a duplicate naming the winner.
async fn insert_and_commit(
    pool: &PgPool,
    mut tx: Transaction<'static, Postgres>,
    create: &CreateInvoice,
) -> AppResult<Invoice> {
    match InvoiceRepo::create(&mut *tx, create).await {
        Ok(invoice) => {
            tx.commit().await?;
            Ok(invoice)
        }
        Err(err) if is_unique_violation(&err, ENGAGEMENT_UNIQUE_CONSTRAINT) => {
            tx.rollback().await?;
            match InvoiceRepo::find_by_engagement(pool, create.engagement_id).await? {
                Some(existing) => Err(CoreError::DuplicateInvoice {
                    engagement_id: create.engagement_id,
                    existing_invoice_id: existing.id,
                }
                .into()),
                None => Err(AppError::Database(err)),
            }
        }
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Derive a draft invoice from an engagement.
///
/// Counterparty, description, display name and amount come from the
/// engagement; issuer name and email come from the actor's profile. The
/// invoice is issued today, due after the configured payment term, and
/// taxed at the configured default rate.
pub async fn generate_from_engagement(
    pool: &PgPool,
    user_id: DbId,
    engagement_id: DbId,
    billing: &BillingConfig,
    today: NaiveDate,
) -> AppResult<Invoice> {
    let mut tx = pool.begin().await?;
    let engagement = lock_uninvoiced_engagement(&mut tx, user_id, engagement_id).await?;
    let issuer = load_issuer(&mut tx, user_id).await?;

    let amounts = InvoiceAmounts::compute(engagement.amount, billing.default_tax_rate)?;
    let invoice_number = allocate_number(&mut tx, today).await?;

    let create = CreateInvoice {
        user_id,
        engagement_id,
        invoice_number,
        invoice_date: today,
        due_date: default_due_date(today, billing.payment_term_days),
        amounts,
        display_name: engagement.display_name.clone(),
        description: engagement.description.clone(),
        client_company: engagement.counterparty_name.clone(),
        client_address: None,
        client_contact: None,
        issuer_name: issuer.issuer_name().to_string(),
        issuer_address: None,
        issuer_email: Some(issuer.email.clone()),
        notes: None,
    };
    let invoice = insert_and_commit(pool, tx, &create).await?;

    tracing::info!(
        user_id,
        engagement_id,
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        total = %invoice.total_amount,
        "Invoice generated from engagement",
    );
    Ok(invoice)
}

/// Create an invoice from caller-supplied fields. The engagement must exist,
/// belong to the actor and not already be invoiced.
pub async fn create_manual(
    pool: &PgPool,
    user_id: DbId,
    input: &CreateInvoiceRequest,
    billing: &BillingConfig,
    today: NaiveDate,
) -> AppResult<Invoice> {
    let manual = validate_manual(input, billing, today)?;

    let mut tx = pool.begin().await?;
    lock_uninvoiced_engagement(&mut tx, user_id, manual.engagement_id).await?;
    let issuer = load_issuer(&mut tx, user_id).await?;
    let invoice_number = allocate_number(&mut tx, manual.invoice_date).await?;

    let create = CreateInvoice {
        user_id,
        engagement_id: manual.engagement_id,
        invoice_number,
        invoice_date: manual.invoice_date,
        due_date: manual.due_date,
        amounts: manual.amounts,
        display_name: manual.display_name,
        description: manual.description,
        client_company: manual.client_company,
        client_address: manual.client_address,
        client_contact: manual.client_contact,
        issuer_name: issuer.issuer_name().to_string(),
        issuer_address: manual.issuer_address,
        issuer_email: Some(issuer.email.clone()),
        notes: manual.notes,
    };
    let invoice = insert_and_commit(pool, tx, &create).await?;

    tracing::info!(
        user_id,
        engagement_id = invoice.engagement_id,
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        "Invoice created",
    );
    Ok(invoice)
}

pub async fn get(pool: &PgPool, user_id: DbId, id: DbId) -> AppResult<Invoice> {
    InvoiceRepo::find_for_user(pool, user_id, id)
        .await?
        .ok_or_else(|| not_found("Invoice", id))
}

pub async fn get_by_number(pool: &PgPool, user_id: DbId, number: &str) -> AppResult<Invoice> {
    let missing = || {
        AppError::Core(CoreError::NotFoundByKey {
            entity: "Invoice",
            key: number.to_string(),
        })
    };
    if parse_invoice_number(number).is_none() {
        return Err(missing());
    }
    InvoiceRepo::find_by_number(pool, user_id, number)
        .await?
        .ok_or_else(missing)
}

/// One page of invoices, newest first, plus the total matching `filter`.
pub async fn list(
    pool: &PgPool,
    user_id: DbId,
    filter: &InvoiceFilter,
) -> AppResult<(Vec<Invoice>, i64)> {
    if let Some(status) = filter.status.as_deref() {
        InvoiceStatus::from_str_value(status)?;
    }
    let items = InvoiceRepo::list(pool, user_id, filter).await?;
    let total = InvoiceRepo::count(pool, user_id, filter).await?;
    Ok((items, total))
}

/// Sent or overdue invoices whose due date has passed.
pub async fn list_overdue(
    pool: &PgPool,
    user_id: DbId,
    today: NaiveDate,
) -> AppResult<Vec<Invoice>> {
    Ok(InvoiceRepo::list_overdue(pool, user_id, today).await?)
}

/// Apply a partial update, recomputing tax and total whenever the subtotal
/// or rate changes.
pub async fn update(
    pool: &PgPool,
    user_id: DbId,
    id: DbId,
    input: &UpdateInvoiceRequest,
    today: NaiveDate,
) -> AppResult<Invoice> {
    let mut tx = pool.begin().await?;
    let current = InvoiceRepo::lock_for_user(&mut *tx, user_id, id)
        .await?
        .ok_or_else(|| not_found("Invoice", id))?;

    let changes = match validate_update(&current, input, today) {
        Ok(changes) => changes,
        Err(err @ CoreError::PermissionDenied(_)) => {
            tracing::warn!(user_id, invoice_id = id, "Amount change on paid invoice rejected");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let updated = InvoiceRepo::update(&mut *tx, id, &changes)
        .await?
        .ok_or_else(|| not_found("Invoice", id))?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        invoice_id = id,
        status = %updated.status,
        total = %updated.total_amount,
        "Invoice updated",
    );
    Ok(updated)
}

/// Delete an invoice that has not been paid. The engagement is untouched.
pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let current = InvoiceRepo::lock_for_user(&mut *tx, user_id, id)
        .await?
        .ok_or_else(|| not_found("Invoice", id))?;
    if let Err(err) = invoice::ensure_deletable(current.parsed_status()?) {
        tracing::warn!(user_id, invoice_id = id, "Deletion of paid invoice rejected");
        return Err(err.into());
    }
    InvoiceRepo::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        invoice_id = id,
        invoice_number = %current.invoice_number,
        "Invoice deleted",
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn stored(status: &str) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: 1,
            user_id: 1,
            engagement_id: 1,
            invoice_number: "INV-202509-001".to_string(),
            invoice_date: date(2025, 9, 1),
            due_date: date(2025, 10, 1),
            subtotal: dec("1000.00"),
            tax_rate: dec("10.00"),
            tax_amount: dec("100.00"),
            total_amount: dec("1100.00"),
            display_name: None,
            description: "Sponsored video".to_string(),
            client_company: "Acme".to_string(),
            client_address: None,
            client_contact: None,
            issuer_name: "creator".to_string(),
            issuer_address: None,
            issuer_email: None,
            status: status.to_string(),
            notes: None,
            payment_date: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn manual_defaults_dates_and_rate() {
        let input = CreateInvoiceRequest {
            engagement_id: Some(9),
            client_company: "Acme".to_string(),
            subtotal: json!("1234.56"),
            description: "Campaign".to_string(),
            ..Default::default()
        };
        let manual = validate_manual(&input, &BillingConfig::default(), date(2025, 9, 30)).unwrap();
        assert_eq!(manual.invoice_date, date(2025, 9, 30));
        assert_eq!(manual.due_date, date(2025, 10, 30));
        assert_eq!(manual.amounts.tax_amount, dec("123.46"));
        assert_eq!(manual.amounts.total_amount, dec("1358.02"));
    }

    #[test]
    fn manual_requires_engagement() {
        let input = CreateInvoiceRequest {
            client_company: "Acme".to_string(),
            subtotal: json!(100),
            description: "Campaign".to_string(),
            ..Default::default()
        };
        assert_matches!(
            validate_manual(&input, &BillingConfig::default(), date(2025, 9, 30)),
            Err(CoreError::Validation(msg)) if msg.contains("engagement_id")
        );
    }

    #[test]
    fn manual_rejects_due_before_issue() {
        let input = CreateInvoiceRequest {
            engagement_id: Some(9),
            client_company: "Acme".to_string(),
            subtotal: json!(100),
            description: "Campaign".to_string(),
            invoice_date: Some("2025-09-30".to_string()),
            due_date: Some("2025-09-01".to_string()),
            ..Default::default()
        };
        assert_matches!(
            validate_manual(&input, &BillingConfig::default(), date(2025, 9, 30)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn update_recomputes_from_stored_rate() {
        let input = UpdateInvoiceRequest {
            subtotal: Some(json!("2000")),
            ..Default::default()
        };
        let changes = validate_update(&stored("draft"), &input, date(2025, 9, 30)).unwrap();
        let amounts = changes.amounts.unwrap();
        assert_eq!(amounts.tax_rate, dec("10.00"));
        assert_eq!(amounts.tax_amount, dec("200.00"));
        assert_eq!(amounts.total_amount, dec("2200.00"));
    }

    #[test]
    fn update_freezes_paid_amounts() {
        let input = UpdateInvoiceRequest {
            tax_rate: Some(json!(8)),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&stored("paid"), &input, date(2025, 9, 30)),
            Err(CoreError::PermissionDenied(_))
        );
    }

    #[test]
    fn marking_paid_records_today() {
        let input = UpdateInvoiceRequest {
            status: Some("paid".to_string()),
            ..Default::default()
        };
        let changes = validate_update(&stored("sent"), &input, date(2025, 9, 30)).unwrap();
        assert_eq!(changes.status.as_deref(), Some("paid"));
        assert_eq!(changes.payment_date, Some(date(2025, 9, 30)));
    }

    #[test]
    fn update_rejects_unknown_status() {
        let input = UpdateInvoiceRequest {
            status: Some("void".to_string()),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&stored("draft"), &input, date(2025, 9, 30)),
            Err(CoreError::InvalidStatus(_))
        );
    }

    /// An insert that loses the engagement's unique constraint reports the
    /// invoice that won, not a database error.
    #[sqlx::test(migrations = "../../db/migrations")]
    async fn lost_insert_race_reports_winner(pool: PgPool) {
        use influberry_db::models::engagement::CreateEngagement;
        use influberry_db::models::user::CreateUser;

        let user = UserRepo::create(
            &pool,
            &CreateUser {
                username: "racer".to_string(),
                email: "racer@example.com".to_string(),
                display_name: None,
                plan_type: None,
            },
        )
        .await
        .unwrap();
        let engagement = EngagementRepo::create(
            &pool,
            &CreateEngagement {
                user_id: user.id,
                counterparty_name: "Acme".to_string(),
                amount: dec("1000"),
                deadline: date(2025, 10, 10),
                description: "Sponsored video".to_string(),
                display_name: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let draft = |number: &str| CreateInvoice {
            user_id: user.id,
            engagement_id: engagement.id,
            invoice_number: number.to_string(),
            invoice_date: date(2025, 9, 30),
            due_date: date(2025, 10, 30),
            amounts: InvoiceAmounts::compute(dec("1000"), dec("10")).unwrap(),
            display_name: None,
            description: "Sponsored video".to_string(),
            client_company: "Acme".to_string(),
            client_address: None,
            client_contact: None,
            issuer_name: "racer".to_string(),
            issuer_address: None,
            issuer_email: None,
            notes: None,
        };

        let winner = InvoiceRepo::create(&pool, &draft("INV-202509-001")).await.unwrap();

        let tx = pool.begin().await.unwrap();
        let result = insert_and_commit(&pool, tx, &draft("INV-202509-002")).await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::DuplicateInvoice {
                existing_invoice_id,
                ..
            })) if existing_invoice_id == winner.id
        );
    }
}
