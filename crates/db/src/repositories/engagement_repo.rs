//! Repository for the `engagements` table.
//!
//! Every lookup is scoped by `user_id`, so a row owned by someone else is
//! indistinguishable from a missing one.

use chrono::NaiveDate;
use influberry_core::engagement::{STATUS_COMPLETED, STATUS_PROPOSED};
use influberry_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use influberry_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::engagement::{
    CreateEngagement, Engagement, EngagementFilter, UpdateEngagement,
};
use crate::models::stats::EngagementStatsRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, counterparty_name, amount, deadline, description, status, \
                       display_name, notes, created_at, updated_at";

/// Shared WHERE fragment for listing and counting. `$1` is the owner.
const FILTER_CLAUSE: &str = "user_id = $1 \
     AND ($2::TEXT IS NULL OR status = $2) \
     AND ($3::DATE IS NULL OR deadline >= $3) \
     AND ($4::DATE IS NULL OR deadline <= $4)";

pub struct EngagementRepo;

impl EngagementRepo {
    /// Insert a new engagement in the proposed state.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateEngagement,
    ) -> Result<Engagement, sqlx::Error> {
        let query = format!(
            "INSERT INTO engagements
                (user_id, counterparty_name, amount, deadline, description, status, display_name, notes)
             VALUES ($1, $2, $3, $4, $5, '{STATUS_PROPOSED}', $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(input.user_id)
            .bind(&input.counterparty_name)
            .bind(input.amount)
            .bind(input.deadline)
            .bind(&input.description)
            .bind(&input.display_name)
            .bind(&input.notes)
            .fetch_one(executor)
            .await
    }

    pub async fn find_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Engagement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM engagements WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Engagement>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Like [`Self::find_for_user`] but takes a row lock held until the
    /// surrounding transaction ends.
    pub async fn lock_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Engagement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM engagements WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// List an actor's engagements, deadline ascending then newest first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &EngagementFilter,
    ) -> Result<Vec<Engagement>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM engagements WHERE {FILTER_CLAUSE} \
             ORDER BY deadline ASC, created_at DESC, id ASC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(filter.deadline_from)
            .bind(filter.deadline_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count rows matching the same filter as [`Self::list`], ignoring paging.
    pub async fn count(
        pool: &PgPool,
        user_id: DbId,
        filter: &EngagementFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM engagements WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(filter.deadline_from)
            .bind(filter.deadline_to)
            .fetch_one(pool)
            .await
    }

    /// Open engagements whose deadline is before `today`.
    pub async fn list_overdue(
        pool: &PgPool,
        user_id: DbId,
        today: NaiveDate,
    ) -> Result<Vec<Engagement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM engagements \
             WHERE user_id = $1 AND status <> '{STATUS_COMPLETED}' AND deadline < $2 \
             ORDER BY deadline ASC, id ASC"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(user_id)
            .bind(today)
            .fetch_all(pool)
            .await
    }

    /// Open engagements due between `today` and `until`, inclusive.
    pub async fn list_upcoming(
        pool: &PgPool,
        user_id: DbId,
        today: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Engagement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM engagements \
             WHERE user_id = $1 AND status <> '{STATUS_COMPLETED}' \
               AND deadline >= $2 AND deadline <= $3 \
             ORDER BY deadline ASC, id ASC"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(user_id)
            .bind(today)
            .bind(until)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if no row with `id` exists.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &UpdateEngagement,
    ) -> Result<Option<Engagement>, sqlx::Error> {
        let query = format!(
            "UPDATE engagements SET
                counterparty_name = COALESCE($2, counterparty_name),
                amount = COALESCE($3, amount),
                deadline = COALESCE($4, deadline),
                description = COALESCE($5, description),
                display_name = COALESCE($6, display_name),
                notes = COALESCE($7, notes),
                status = COALESCE($8, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Engagement>(&query)
            .bind(id)
            .bind(&input.counterparty_name)
            .bind(input.amount)
            .bind(input.deadline)
            .bind(&input.description)
            .bind(&input.display_name)
            .bind(&input.notes)
            .bind(&input.status)
            .fetch_optional(executor)
            .await
    }

    /// Set the status column. `updated_at` moves via trigger.
    pub async fn set_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: &str,
    ) -> Result<Option<Engagement>, sqlx::Error> {
        let query = format!("UPDATE engagements SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Engagement>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await
    }

    /// Delete an engagement. Its invoice and task go with it via
    /// `ON DELETE CASCADE`. Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM engagements WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Counts per status plus realized and potential earnings, in one pass.
    pub async fn stats(pool: &PgPool, user_id: DbId) -> Result<EngagementStatsRow, sqlx::Error> {
        sqlx::query_as::<_, EngagementStatsRow>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'proposed') AS proposed,
                COUNT(*) FILTER (WHERE status = 'contracted') AS contracted,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COALESCE(SUM(amount) FILTER (WHERE status = 'completed'), 0) AS total_earnings,
                COALESCE(SUM(amount), 0) AS total_potential
             FROM engagements
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
