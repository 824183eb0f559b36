//! Route definitions for the `/invoices` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::invoice;
use crate::state::AppState;

/// Routes mounted at `/invoices`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /stats             -> stats
/// GET    /overdue           -> list_overdue
/// GET    /number/{number}   -> get_by_number
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(invoice::list).post(invoice::create))
        .route("/stats", get(invoice::stats))
        .route("/overdue", get(invoice::list_overdue))
        .route("/number/{number}", get(invoice::get_by_number))
        .route(
            "/{id}",
            get(invoice::get_by_id)
                .put(invoice::update)
                .delete(invoice::delete),
        )
}
