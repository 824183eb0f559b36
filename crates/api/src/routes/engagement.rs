//! Route definitions for the `/engagements` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::engagement;
use crate::state::AppState;

/// Routes mounted at `/engagements`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /stats               -> stats
/// GET    /overdue             -> list_overdue
/// GET    /upcoming            -> list_upcoming
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete
/// PUT    /{id}/status         -> transition
/// POST   /{id}/invoice        -> generate_invoice
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(engagement::list).post(engagement::create))
        .route("/stats", get(engagement::stats))
        .route("/overdue", get(engagement::list_overdue))
        .route("/upcoming", get(engagement::list_upcoming))
        .route(
            "/{id}",
            get(engagement::get_by_id)
                .put(engagement::update)
                .delete(engagement::delete),
        )
        .route("/{id}/status", put(engagement::transition))
        .route("/{id}/invoice", post(engagement::generate_invoice))
}
