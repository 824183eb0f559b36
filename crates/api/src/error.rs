use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use influberry_core::error::CoreError;
use influberry_core::types::DbId;
use serde::Serialize;

/// Error returned by every handler and engine operation.
///
/// Domain failures arrive as [`CoreError`]; database failures as
/// [`sqlx::Error`]. Both render as `{ "error", "code" }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    /// Set only for `DUPLICATE_INVOICE`, so the client can open the invoice
    /// that already exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_invoice_id: Option<DbId>,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn classify_core(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { .. } | CoreError::NotFoundByKey { .. } => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::InvalidStatus(msg) => (StatusCode::BAD_REQUEST, "INVALID_STATUS", msg.clone()),
        CoreError::PermissionDenied(msg) => {
            (StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg.clone())
        }
        CoreError::DuplicateInvoice { engagement_id, .. } => (
            StatusCode::CONFLICT,
            "DUPLICATE_INVOICE",
            format!("An invoice already exists for engagement {engagement_id}"),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Map a sqlx error onto a status, code and client-safe message.
///
/// - `RowNotFound` is 404.
/// - 23505 on a `uq_*` constraint is 409.
/// - 23514 on a `ck_*` constraint is 400. Guards normally reject such input
///   before it reaches the database.
/// - Anything else is 500 and logged.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default();
            match db_err.code().as_deref() {
                Some("23505") if constraint.starts_with("uq_") => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
                Some("23514") if constraint.starts_with("ck_") => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("Value violates check constraint: {constraint}"),
                ),
                _ => {
                    tracing::error!(error = %db_err, constraint, "Database error");
                    internal()
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Database(err) => classify_sqlx_error(err),
        };

        let existing_invoice_id = match &self {
            AppError::Core(CoreError::DuplicateInvoice {
                existing_invoice_id,
                ..
            }) => Some(*existing_invoice_id),
            _ => None,
        };

        let body = ErrorBody {
            error: message,
            code,
            existing_invoice_id,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn duplicate_invoice_names_existing_invoice() {
        let (status, body) = render(
            CoreError::DuplicateInvoice {
                engagement_id: 3,
                existing_invoice_id: 11,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_INVOICE");
        assert_eq!(body["existing_invoice_id"], 11);
    }

    #[tokio::test]
    async fn other_errors_omit_invoice_id() {
        let (status, body) = render(CoreError::PermissionDenied("paid".into()).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");
        assert!(body.get("existing_invoice_id").is_none());
    }

    #[tokio::test]
    async fn lookup_by_key_is_not_found() {
        let (status, body) = render(
            CoreError::NotFoundByKey {
                entity: "Invoice",
                key: "INV-202509-009".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let (status, body) = render(CoreError::Internal("bad status 'x' in row 4".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }
}
