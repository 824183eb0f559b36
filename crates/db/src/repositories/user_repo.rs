//! Repository for the `users` table.

use influberry_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::user::{CreateUser, User};

const COLUMNS: &str =
    "id, username, email, display_name, plan_type, is_active, created_at, updated_at";

/// Read access to actor profiles, plus creation for provisioning and tests.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user. `plan_type` defaults to `free`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, display_name, plan_type)
             VALUES ($1, $2, $3, COALESCE($4, 'free'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.plan_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find an active user. Deactivated accounts are treated as absent.
    pub async fn find_active(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND is_active = true");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
