use std::sync::Arc;

use chrono::NaiveDate;
use influberry_core::clock::Clock;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: influberry_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Source of "today" for deadline and overdue calculations.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
