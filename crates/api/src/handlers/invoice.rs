//! Handlers for the `/invoices` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use influberry_core::types::DbId;
use influberry_db::models::invoice::InvoiceFilter;

use crate::engine::invoices::{self, CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::engine::stats;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::filter_value;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{InvoiceView, Page};

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoiceParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /invoices?status=&limit=&offset=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListInvoiceParams>,
) -> AppResult<impl IntoResponse> {
    let filter = InvoiceFilter {
        status: filter_value(params.status),
        limit: params.limit,
        offset: params.offset,
    };
    let (rows, total) = invoices::list(&state.pool, auth.user_id, &filter).await?;
    let items = InvoiceView::many(rows, state.today())?;

    Ok(Json(DataResponse {
        data: Page::new(items, total, filter.limit, filter.offset),
    }))
}

/// POST /invoices
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateInvoiceRequest>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let invoice =
        invoices::create_manual(&state.pool, auth.user_id, &input, &state.config.billing, today)
            .await?;
    let view = InvoiceView::new(invoice, today)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /invoices/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let invoice = invoices::get(&state.pool, auth.user_id, id).await?;
    Ok(Json(DataResponse {
        data: InvoiceView::new(invoice, state.today())?,
    }))
}

/// GET /invoices/number/{number}
pub async fn get_by_number(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> AppResult<impl IntoResponse> {
    let invoice = invoices::get_by_number(&state.pool, auth.user_id, &number).await?;
    Ok(Json(DataResponse {
        data: InvoiceView::new(invoice, state.today())?,
    }))
}

/// PUT /invoices/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateInvoiceRequest>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let invoice = invoices::update(&state.pool, auth.user_id, id, &input, today).await?;
    Ok(Json(DataResponse {
        data: InvoiceView::new(invoice, today)?,
    }))
}

/// DELETE /invoices/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    invoices::delete(&state.pool, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /invoices/overdue
pub async fn list_overdue(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let today = state.today();
    let rows = invoices::list_overdue(&state.pool, auth.user_id, today).await?;
    Ok(Json(DataResponse {
        data: InvoiceView::many(rows, today)?,
    }))
}

/// GET /invoices/stats
pub async fn stats(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = stats::invoice_summary(&state.pool, auth.user_id, state.today()).await?;
    Ok(Json(DataResponse { data: summary }))
}
