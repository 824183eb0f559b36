//! Handlers for the `/todos` resource. Todos are addressed by the id of the
//! engagement their task is attached to.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use influberry_core::task::TodoSort;
use influberry_core::types::DbId;

use crate::engine::todos::{self, AttachTaskRequest, UpdateTaskRequest};
use crate::engine::stats;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::filter_value;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::TodoView;

#[derive(Debug, Default, Deserialize)]
pub struct ListTodoParams {
    /// Task state: `pending`, `completed` or `all`.
    pub status: Option<String>,
    pub priority: Option<String>,
    pub importance: Option<String>,
    pub sort: Option<String>,
}

/// GET /todos?status=&priority=&importance=&sort=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListTodoParams>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let status = filter_value(params.status);
    let priority = filter_value(params.priority);
    let importance = filter_value(params.importance);
    let filter =
        todos::todo_filter(status.as_deref(), priority.as_deref(), importance.as_deref())?;
    let sort = params
        .sort
        .as_deref()
        .map(TodoSort::from_str_value)
        .unwrap_or_default();

    let rows = todos::list(&state.pool, auth.user_id, &filter, sort, today).await?;
    let items = rows
        .into_iter()
        .map(|todo| TodoView::new(todo, today))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { data: items }))
}

/// POST /todos
pub async fn attach(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AttachTaskRequest>,
) -> AppResult<impl IntoResponse> {
    let todo = todos::attach(&state.pool, auth.user_id, &input).await?;
    let view = TodoView::new(todo, state.today())?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /todos/{engagement_id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(engagement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let todo = todos::get(&state.pool, auth.user_id, engagement_id).await?;
    Ok(Json(DataResponse {
        data: TodoView::new(todo, state.today())?,
    }))
}

/// PUT /todos/{engagement_id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(engagement_id): Path<DbId>,
    Json(input): Json<UpdateTaskRequest>,
) -> AppResult<impl IntoResponse> {
    let todo = todos::update(&state.pool, auth.user_id, engagement_id, &input).await?;
    Ok(Json(DataResponse {
        data: TodoView::new(todo, state.today())?,
    }))
}

/// PUT /todos/{engagement_id}/complete
pub async fn toggle_complete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(engagement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let todo = todos::toggle_complete(&state.pool, auth.user_id, engagement_id).await?;
    Ok(Json(DataResponse {
        data: TodoView::new(todo, state.today())?,
    }))
}

/// DELETE /todos/{engagement_id}
pub async fn detach(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(engagement_id): Path<DbId>,
) -> AppResult<StatusCode> {
    todos::detach(&state.pool, auth.user_id, engagement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /todos/stats
pub async fn stats(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = stats::todo_summary(&state.pool, auth.user_id, state.today()).await?;
    Ok(Json(DataResponse { data: summary }))
}
