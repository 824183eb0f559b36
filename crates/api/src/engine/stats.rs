//! Per-actor dashboards. Each summary is one aggregate query.

use chrono::NaiveDate;
use influberry_core::stats::{month_start, EngagementSummary, InvoiceSummary, TodoSummary};
use influberry_core::types::DbId;
use influberry_db::repositories::{EngagementRepo, InvoiceRepo, TaskRepo};
use sqlx::PgPool;

use crate::error::AppResult;

/// Counts per status, realized earnings (completed) and potential earnings
/// (every status).
pub async fn engagement_summary(pool: &PgPool, user_id: DbId) -> AppResult<EngagementSummary> {
    Ok(EngagementRepo::stats(pool, user_id).await?.into())
}

pub async fn invoice_summary(
    pool: &PgPool,
    user_id: DbId,
    today: NaiveDate,
) -> AppResult<InvoiceSummary> {
    Ok(InvoiceRepo::stats(pool, user_id, month_start(today)).await?.into())
}

pub async fn todo_summary(pool: &PgPool, user_id: DbId, today: NaiveDate) -> AppResult<TodoSummary> {
    Ok(TaskRepo::stats(pool, user_id, today).await?.into())
}
