//! Repository for the `invoice_sequences` counter table.

use influberry_core::invoice::number_prefix;
use sqlx::PgExecutor;

pub struct InvoiceSequenceRepo;

impl InvoiceSequenceRepo {
    /// Advance and return the counter for `year_month` (`YYYYMM`).
    ///
    /// A single upsert, so concurrent callers serialize on the row lock and
    /// each receives a distinct value. The first call for a month seeds the
    /// counter from the highest number already present under that prefix.
    /// Must run inside the transaction that inserts the invoice so a
    /// rollback also returns the value.
    pub async fn next_value(
        executor: impl PgExecutor<'_>,
        year_month: &str,
    ) -> Result<i64, sqlx::Error> {
        let like_pattern = format!("{}%", number_prefix(year_month));
        let value = sqlx::query_scalar::<_, i64>(
            "INSERT INTO invoice_sequences (year_month, last_value)
             VALUES (
                $1,
                COALESCE((
                    SELECT MAX(CAST(SPLIT_PART(invoice_number, '-', 3) AS BIGINT))
                    FROM invoices
                    WHERE invoice_number LIKE $2
                      AND SPLIT_PART(invoice_number, '-', 3) ~ '^[0-9]+$'
                ), 0) + 1
             )
             ON CONFLICT (year_month) DO UPDATE
                SET last_value = invoice_sequences.last_value + 1,
                    updated_at = NOW()
             RETURNING last_value",
        )
        .bind(year_month)
        .bind(like_pattern)
        .fetch_one(executor)
        .await?;
        tracing::debug!(year_month, value, "Allocated invoice sequence value");
        Ok(value)
    }

    /// Last value handed out for `year_month`, if any.
    pub async fn current(
        executor: impl PgExecutor<'_>,
        year_month: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT last_value FROM invoice_sequences WHERE year_month = $1",
        )
        .bind(year_month)
        .fetch_optional(executor)
        .await
    }
}
