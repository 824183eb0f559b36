pub mod engagement;
pub mod health;
pub mod invoice;
pub mod todo;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /engagements                                     list, create
/// /engagements/stats                               aggregate stats
/// /engagements/overdue                             overdue list
/// /engagements/upcoming                            upcoming deadlines
/// /engagements/{id}                                get, update, delete
/// /engagements/{id}/status                         transition (PUT)
/// /engagements/{id}/invoice                        generate invoice (POST)
///
/// /todos                                           ranked list, attach
/// /todos/stats                                     todo stats
/// /todos/{engagement_id}                           get, update, detach
/// /todos/{engagement_id}/complete                  toggle completion (PUT)
///
/// /invoices                                        list, manual create
/// /invoices/stats                                  invoice stats
/// /invoices/overdue                                overdue list
/// /invoices/number/{number}                        get by invoice number
/// /invoices/{id}                                   get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/engagements", engagement::router())
        .nest("/todos", todo::router())
        .nest("/invoices", invoice::router())
}
