//! Task extensions on engagements and the ranked todo list.

use chrono::NaiveDate;
use influberry_core::engagement::{parse_date, validate_optional_text, validate_required_text};
use influberry_core::error::CoreError;
use influberry_core::task::{
    rank_todos, validate_importance, TaskPriority, TaskState, TodoSort,
    MAX_TASK_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use influberry_core::types::DbId;
use influberry_db::models::task::{CreateEngagementTask, Todo, TodoFilter, UpdateEngagementTask};
use influberry_db::repositories::{EngagementRepo, TaskRepo};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};

use super::{is_any_unique_violation, not_found};
use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /todos`.
#[derive(Debug, Default, Deserialize)]
pub struct AttachTaskRequest {
    #[serde(default)]
    pub engagement_id: Option<DbId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub importance: Option<i16>,
}

/// Body of `PUT /todos/{engagement_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub importance: Option<i16>,
}

fn parse_priority(raw: Option<&str>) -> Result<Option<String>, CoreError> {
    raw.map(|p| TaskPriority::from_str_value(p.trim()).map(|p| p.as_str().to_string()))
        .transpose()
}

fn validate_attach(input: &AttachTaskRequest) -> Result<CreateEngagementTask, CoreError> {
    let engagement_id = input
        .engagement_id
        .ok_or_else(|| CoreError::Validation("engagement_id is required".to_string()))?;

    Ok(CreateEngagementTask {
        engagement_id,
        title: validate_required_text("title", &input.title, MAX_TITLE_LENGTH)?,
        description: validate_optional_text(
            "description",
            input.description.as_deref(),
            MAX_TASK_DESCRIPTION_LENGTH,
        )?,
        due_date: input
            .due_date
            .as_deref()
            .map(|raw| parse_date("due_date", raw))
            .transpose()?,
        priority: parse_priority(input.priority.as_deref())?,
        importance: input.importance.map(validate_importance).transpose()?,
    })
}

fn validate_update(input: &UpdateTaskRequest) -> Result<UpdateEngagementTask, CoreError> {
    Ok(UpdateEngagementTask {
        title: input
            .title
            .as_deref()
            .map(|v| validate_required_text("title", v, MAX_TITLE_LENGTH))
            .transpose()?,
        description: validate_optional_text(
            "description",
            input.description.as_deref(),
            MAX_TASK_DESCRIPTION_LENGTH,
        )?,
        due_date: input
            .due_date
            .as_deref()
            .map(|raw| parse_date("due_date", raw))
            .transpose()?,
        priority: parse_priority(input.priority.as_deref())?,
        importance: input.importance.map(validate_importance).transpose()?,
    })
}

/// Build a list filter from raw query values. `None` means unfiltered.
pub fn todo_filter(
    state: Option<&str>,
    priority: Option<&str>,
    importance: Option<&str>,
) -> Result<TodoFilter, CoreError> {
    let state = state
        .map(|s| TaskState::from_str_value(s).map(|s| s.as_str().to_string()))
        .transpose()?;
    let importance = importance
        .map(|raw| {
            raw.parse::<i16>()
                .map_err(|_| {
                    CoreError::Validation(format!("importance must be an integer, got '{raw}'"))
                })
                .and_then(validate_importance)
        })
        .transpose()?;

    Ok(TodoFilter {
        state,
        priority: parse_priority(priority)?,
        importance,
    })
}

async fn load_todo(conn: &mut PgConnection, user_id: DbId, engagement_id: DbId) -> AppResult<Todo> {
    TaskRepo::find_todo(conn, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Attach a pending task to an engagement that has none.
pub async fn attach(pool: &PgPool, user_id: DbId, input: &AttachTaskRequest) -> AppResult<Todo> {
    let create = validate_attach(input)?;
    let engagement_id = create.engagement_id;
    let already_attached = || {
        CoreError::Conflict(format!(
            "Engagement {engagement_id} already has a task attached"
        ))
    };

    let mut tx = pool.begin().await?;
    EngagementRepo::lock_for_user(&mut *tx, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Engagement", engagement_id))?;
    if TaskRepo::find(&mut *tx, engagement_id).await?.is_some() {
        return Err(already_attached().into());
    }
    match TaskRepo::create(&mut *tx, &create).await {
        Ok(_) => {}
        Err(err) if is_any_unique_violation(&err) => return Err(already_attached().into()),
        Err(err) => return Err(err.into()),
    }
    let todo = load_todo(&mut tx, user_id, engagement_id).await?;
    tx.commit().await?;

    tracing::info!(user_id, engagement_id, title = %todo.task_title, "Task attached");
    Ok(todo)
}

pub async fn get(pool: &PgPool, user_id: DbId, engagement_id: DbId) -> AppResult<Todo> {
    TaskRepo::find_todo(pool, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))
}

/// The actor's todos matching `filter`, ranked by `sort`.
pub async fn list(
    pool: &PgPool,
    user_id: DbId,
    filter: &TodoFilter,
    sort: TodoSort,
    today: NaiveDate,
) -> AppResult<Vec<Todo>> {
    let mut todos = TaskRepo::list_todos(pool, user_id, filter).await?;
    rank_todos(&mut todos, sort, today);
    Ok(todos)
}

pub async fn update(
    pool: &PgPool,
    user_id: DbId,
    engagement_id: DbId,
    input: &UpdateTaskRequest,
) -> AppResult<Todo> {
    let changes = validate_update(input)?;

    let mut tx = pool.begin().await?;
    EngagementRepo::lock_for_user(&mut *tx, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))?;
    TaskRepo::update(&mut *tx, engagement_id, &changes)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))?;
    let todo = load_todo(&mut tx, user_id, engagement_id).await?;
    tx.commit().await?;

    tracing::info!(user_id, engagement_id, "Task updated");
    Ok(todo)
}

/// Flip the task between pending and completed.
pub async fn toggle_complete(pool: &PgPool, user_id: DbId, engagement_id: DbId) -> AppResult<Todo> {
    let mut tx = pool.begin().await?;
    EngagementRepo::lock_for_user(&mut *tx, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))?;
    let task = TaskRepo::find(&mut *tx, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))?;
    let next = task.parsed_state()?.toggled();
    TaskRepo::set_state(&mut *tx, engagement_id, next.as_str()).await?;
    let todo = load_todo(&mut tx, user_id, engagement_id).await?;
    tx.commit().await?;

    tracing::info!(user_id, engagement_id, state = next.as_str(), "Task state toggled");
    Ok(todo)
}

/// Remove the task. The engagement itself survives.
pub async fn detach(pool: &PgPool, user_id: DbId, engagement_id: DbId) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    EngagementRepo::lock_for_user(&mut *tx, user_id, engagement_id)
        .await?
        .ok_or_else(|| not_found("Todo", engagement_id))?;
    if !TaskRepo::delete(&mut *tx, engagement_id).await? {
        return Err(not_found("Todo", engagement_id));
    }
    tx.commit().await?;

    tracing::info!(user_id, engagement_id, "Task detached");
    Ok(())
}
