//! Repository for the `invoices` table.

use chrono::NaiveDate;
use influberry_core::invoice::COLLECTIBLE_STATUSES;
use influberry_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use influberry_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::invoice::{CreateInvoice, Invoice, InvoiceFilter, UpdateInvoice};
use crate::models::stats::InvoiceStatsRow;

/// Constraint enforcing one invoice per engagement.
pub const ENGAGEMENT_UNIQUE_CONSTRAINT: &str = "uq_invoices_engagement";

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, engagement_id, invoice_number, invoice_date, due_date, \
     subtotal, tax_rate, tax_amount, total_amount, display_name, description, \
     client_company, client_address, client_contact, issuer_name, issuer_address, \
     issuer_email, status, notes, payment_date, payment_method, created_at, updated_at";

pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Insert a new draft invoice.
    ///
    /// A second invoice for the same engagement fails on
    /// [`ENGAGEMENT_UNIQUE_CONSTRAINT`].
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateInvoice,
    ) -> Result<Invoice, sqlx::Error> {
        let query = format!(
            "INSERT INTO invoices
                (user_id, engagement_id, invoice_number, invoice_date, due_date,
                 subtotal, tax_rate, tax_amount, total_amount, display_name, description,
                 client_company, client_address, client_contact,
                 issuer_name, issuer_address, issuer_email, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(input.user_id)
            .bind(input.engagement_id)
            .bind(&input.invoice_number)
            .bind(input.invoice_date)
            .bind(input.due_date)
            .bind(input.amounts.subtotal)
            .bind(input.amounts.tax_rate)
            .bind(input.amounts.tax_amount)
            .bind(input.amounts.total_amount)
            .bind(&input.display_name)
            .bind(&input.description)
            .bind(&input.client_company)
            .bind(&input.client_address)
            .bind(&input.client_contact)
            .bind(&input.issuer_name)
            .bind(&input.issuer_address)
            .bind(&input.issuer_email)
            .bind(&input.notes)
            .fetch_one(executor)
            .await
    }

    pub async fn find_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Row-locking variant of [`Self::find_for_user`].
    pub async fn lock_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM invoices WHERE id = $1 AND user_id = $2 FOR UPDATE");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_number(
        pool: &PgPool,
        user_id: DbId,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoices WHERE invoice_number = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(invoice_number)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The invoice referencing `engagement_id`, regardless of owner.
    pub async fn find_by_engagement(
        executor: impl PgExecutor<'_>,
        engagement_id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE engagement_id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(engagement_id)
            .fetch_optional(executor)
            .await
    }

    /// List an actor's invoices, newest first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM invoices \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        user_id: DbId,
        filter: &InvoiceFilter,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(&filter.status)
        .fetch_one(pool)
        .await
    }

    /// Sent or already-flagged invoices past their due date, oldest due first.
    pub async fn list_overdue(
        pool: &PgPool,
        user_id: DbId,
        today: NaiveDate,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoices \
             WHERE user_id = $1 AND due_date < $2 AND status = ANY($3) \
             ORDER BY due_date ASC, id ASC"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(user_id)
            .bind(today)
            .bind(COLLECTIBLE_STATUSES)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if no row with `id` exists.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET
                subtotal = COALESCE($2, subtotal),
                tax_rate = COALESCE($3, tax_rate),
                tax_amount = COALESCE($4, tax_amount),
                total_amount = COALESCE($5, total_amount),
                due_date = COALESCE($6, due_date),
                display_name = COALESCE($7, display_name),
                description = COALESCE($8, description),
                client_company = COALESCE($9, client_company),
                client_address = COALESCE($10, client_address),
                client_contact = COALESCE($11, client_contact),
                issuer_address = COALESCE($12, issuer_address),
                status = COALESCE($13, status),
                notes = COALESCE($14, notes),
                payment_date = COALESCE($15, payment_date),
                payment_method = COALESCE($16, payment_method)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let amounts = input.amounts.as_ref();
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(amounts.map(|a| a.subtotal))
            .bind(amounts.map(|a| a.tax_rate))
            .bind(amounts.map(|a| a.tax_amount))
            .bind(amounts.map(|a| a.total_amount))
            .bind(input.due_date)
            .bind(&input.display_name)
            .bind(&input.description)
            .bind(&input.client_company)
            .bind(&input.client_address)
            .bind(&input.client_contact)
            .bind(&input.issuer_address)
            .bind(&input.status)
            .bind(&input.notes)
            .bind(input.payment_date)
            .bind(&input.payment_method)
            .fetch_optional(executor)
            .await
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Totals per status, paid revenue and invoices issued in the calendar
    /// month starting at `month_start`, in one pass.
    pub async fn stats(
        pool: &PgPool,
        user_id: DbId,
        month_start: NaiveDate,
    ) -> Result<InvoiceStatsRow, sqlx::Error> {
        sqlx::query_as::<_, InvoiceStatsRow>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'draft') AS draft,
                COUNT(*) FILTER (WHERE status = 'sent') AS sent,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid,
                COUNT(*) FILTER (WHERE status = 'overdue') AS overdue,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'paid'), 0) AS total_paid_amount,
                COUNT(*) FILTER (
                    WHERE invoice_date >= $2 AND invoice_date < $2::date + INTERVAL '1 month'
                ) AS this_month
             FROM invoices
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(month_start)
        .fetch_one(pool)
        .await
    }
}
