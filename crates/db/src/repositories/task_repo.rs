//! Repository for the `engagement_tasks` extension table and the joined
//! todo view.

use chrono::{Duration, NaiveDate};
use influberry_core::task::{PRIORITY_HIGH, STATE_COMPLETED, STATE_PENDING, URGENT_WITHIN_DAYS};
use influberry_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::stats::TodoStatsRow;
use crate::models::task::{
    CreateEngagementTask, EngagementTask, Todo, TodoFilter, UpdateEngagementTask,
};

const COLUMNS: &str =
    "engagement_id, title, description, due_date, priority, importance, state, created_at, updated_at";

/// Engagement columns followed by task columns with a `task_` prefix.
const TODO_COLUMNS: &str = "e.id, e.user_id, e.counterparty_name, e.amount, e.deadline, \
     e.description, e.status, e.display_name, e.notes, e.created_at, e.updated_at, \
     t.title AS task_title, t.description AS task_description, t.due_date AS task_due_date, \
     t.priority AS task_priority, t.importance AS task_importance, t.state AS task_state, \
     t.created_at AS task_created_at, t.updated_at AS task_updated_at";

pub struct TaskRepo;

impl TaskRepo {
    /// Attach a pending task to an engagement. Fails with a primary-key
    /// violation if one is already attached.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateEngagementTask,
    ) -> Result<EngagementTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO engagement_tasks
                (engagement_id, title, description, due_date, priority, importance, state)
             VALUES ($1, $2, $3, $4, $5, $6, '{STATE_PENDING}')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EngagementTask>(&query)
            .bind(input.engagement_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.priority)
            .bind(input.importance)
            .fetch_one(executor)
            .await
    }

    pub async fn find(
        executor: impl PgExecutor<'_>,
        engagement_id: DbId,
    ) -> Result<Option<EngagementTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM engagement_tasks WHERE engagement_id = $1");
        sqlx::query_as::<_, EngagementTask>(&query)
            .bind(engagement_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn update(
        executor: impl PgExecutor<'_>,
        engagement_id: DbId,
        input: &UpdateEngagementTask,
    ) -> Result<Option<EngagementTask>, sqlx::Error> {
        let query = format!(
            "UPDATE engagement_tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                priority = COALESCE($5, priority),
                importance = COALESCE($6, importance)
             WHERE engagement_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EngagementTask>(&query)
            .bind(engagement_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.priority)
            .bind(input.importance)
            .fetch_optional(executor)
            .await
    }

    pub async fn set_state(
        executor: impl PgExecutor<'_>,
        engagement_id: DbId,
        state: &str,
    ) -> Result<Option<EngagementTask>, sqlx::Error> {
        let query = format!(
            "UPDATE engagement_tasks SET state = $2 WHERE engagement_id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EngagementTask>(&query)
            .bind(engagement_id)
            .bind(state)
            .fetch_optional(executor)
            .await
    }

    /// Remove the task. The engagement is left in place.
    pub async fn delete(
        executor: impl PgExecutor<'_>,
        engagement_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM engagement_tasks WHERE engagement_id = $1")
            .bind(engagement_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One todo owned by `user_id`.
    pub async fn find_todo(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        engagement_id: DbId,
    ) -> Result<Option<Todo>, sqlx::Error> {
        let query = format!(
            "SELECT {TODO_COLUMNS} FROM engagements e \
             JOIN engagement_tasks t ON t.engagement_id = e.id \
             WHERE e.id = $1 AND e.user_id = $2"
        );
        sqlx::query_as::<_, Todo>(&query)
            .bind(engagement_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// All todos for an actor matching `filter`, in id order. Ranking is
    /// applied by the caller.
    pub async fn list_todos(
        pool: &PgPool,
        user_id: DbId,
        filter: &TodoFilter,
    ) -> Result<Vec<Todo>, sqlx::Error> {
        let query = format!(
            "SELECT {TODO_COLUMNS} FROM engagements e \
             JOIN engagement_tasks t ON t.engagement_id = e.id \
             WHERE e.user_id = $1 \
               AND ($2::TEXT IS NULL OR t.state = $2) \
               AND ($3::TEXT IS NULL OR t.priority = $3) \
               AND ($4::SMALLINT IS NULL OR t.importance = $4) \
             ORDER BY e.id ASC"
        );
        sqlx::query_as::<_, Todo>(&query)
            .bind(user_id)
            .bind(&filter.state)
            .bind(&filter.priority)
            .bind(filter.importance)
            .fetch_all(pool)
            .await
    }

    /// Pending/completed counts and due-soon figures in one pass.
    pub async fn stats(
        pool: &PgPool,
        user_id: DbId,
        today: NaiveDate,
    ) -> Result<TodoStatsRow, sqlx::Error> {
        let query = format!(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE t.state = '{STATE_PENDING}') AS pending,
                COUNT(*) FILTER (WHERE t.state = '{STATE_COMPLETED}') AS completed,
                COUNT(*) FILTER (WHERE t.state = '{STATE_PENDING}' AND t.due_date = $2) AS due_today,
                COUNT(*) FILTER (
                    WHERE t.state = '{STATE_PENDING}' AND t.due_date >= $2 AND t.due_date <= $3
                ) AS due_soon,
                COUNT(*) FILTER (
                    WHERE t.state = '{STATE_PENDING}' AND t.priority = '{PRIORITY_HIGH}'
                ) AS high_priority
             FROM engagement_tasks t
             JOIN engagements e ON e.id = t.engagement_id
             WHERE e.user_id = $1"
        );
        sqlx::query_as::<_, TodoStatsRow>(&query)
            .bind(user_id)
            .bind(today)
            .bind(today + Duration::days(URGENT_WITHIN_DAYS))
            .fetch_one(pool)
            .await
    }
}
