//! Handlers for the `/engagements` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use influberry_core::engagement::{parse_date, DEFAULT_UPCOMING_DAYS};
use influberry_core::types::DbId;
use influberry_db::models::engagement::EngagementFilter;

use crate::engine::engagements::{
    self, CreateEngagementRequest, TransitionRequest, UpdateEngagementRequest,
};
use crate::engine::{invoices, stats};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::filter_value;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{EngagementView, InvoiceView, Page};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListEngagementParams {
    pub status: Option<String>,
    pub deadline_from: Option<String>,
    pub deadline_to: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingParams {
    pub days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /engagements?status=&deadline_from=&deadline_to=&limit=&offset=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListEngagementParams>,
) -> AppResult<impl IntoResponse> {
    let filter = EngagementFilter {
        status: filter_value(params.status),
        deadline_from: filter_value(params.deadline_from)
            .map(|raw| parse_date("deadline_from", &raw))
            .transpose()?,
        deadline_to: filter_value(params.deadline_to)
            .map(|raw| parse_date("deadline_to", &raw))
            .transpose()?,
        limit: params.limit,
        offset: params.offset,
    };
    let (rows, total) = engagements::list(&state.pool, auth.user_id, &filter).await?;
    let items = EngagementView::many(rows, state.today())?;

    Ok(Json(DataResponse {
        data: Page::new(items, total, filter.limit, filter.offset),
    }))
}

/// POST /engagements
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEngagementRequest>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let engagement = engagements::create(&state.pool, auth.user_id, &input, today).await?;
    let view = EngagementView::new(engagement, today)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /engagements/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let engagement = engagements::get(&state.pool, auth.user_id, id).await?;
    Ok(Json(DataResponse {
        data: EngagementView::new(engagement, state.today())?,
    }))
}

/// PUT /engagements/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEngagementRequest>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let engagement = engagements::update(&state.pool, auth.user_id, id, &input, today).await?;
    Ok(Json(DataResponse {
        data: EngagementView::new(engagement, today)?,
    }))
}

/// PUT /engagements/{id}/status
pub async fn transition(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let engagement = engagements::transition(&state.pool, auth.user_id, id, &input.status).await?;
    Ok(Json(DataResponse {
        data: EngagementView::new(engagement, state.today())?,
    }))
}

/// DELETE /engagements/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    engagements::delete(&state.pool, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /engagements/overdue
pub async fn list_overdue(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let rows = engagements::list_overdue(&state.pool, auth.user_id, today).await?;
    Ok(Json(DataResponse {
        data: EngagementView::many(rows, today)?,
    }))
}

/// GET /engagements/upcoming?days=
pub async fn list_upcoming(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let days = params.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    let rows = engagements::list_upcoming(&state.pool, auth.user_id, today, days).await?;
    Ok(Json(DataResponse {
        data: EngagementView::many(rows, today)?,
    }))
}

/// GET /engagements/stats
pub async fn stats(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = stats::engagement_summary(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /engagements/{id}/invoice
///
/// Generate a draft invoice from the engagement. Responds 409 with
/// `existing_invoice_id` when one already exists.
pub async fn generate_invoice(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let invoice = invoices::generate_from_engagement(
        &state.pool,
        auth.user_id,
        id,
        &state.config.billing,
        today,
    )
    .await?;
    let view = InvoiceView::new(invoice, today)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}
