//! Route definitions for the `/todos` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::todo;
use crate::state::AppState;

/// Routes mounted at `/todos`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> attach
/// GET    /stats                     -> stats
/// GET    /{engagement_id}           -> get_by_id
/// PUT    /{engagement_id}           -> update
/// DELETE /{engagement_id}           -> detach
/// PUT    /{engagement_id}/complete  -> toggle_complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(todo::list).post(todo::attach))
        .route("/stats", get(todo::stats))
        .route(
            "/{engagement_id}",
            get(todo::get_by_id).put(todo::update).delete(todo::detach),
        )
        .route("/{engagement_id}/complete", put(todo::toggle_complete))
}
