//! Engagement rows and DTOs.

use chrono::NaiveDate;
use influberry_core::engagement::EngagementStatus;
use influberry_core::error::CoreError;
use influberry_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `engagements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Engagement {
    pub id: DbId,
    pub user_id: DbId,
    pub counterparty_name: String,
    pub amount: Decimal,
    pub deadline: NaiveDate,
    pub description: String,
    pub status: String,
    pub display_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Engagement {
    pub fn parsed_status(&self) -> Result<EngagementStatus, CoreError> {
        EngagementStatus::from_str_value(&self.status)
    }
}

/// Validated values for a new engagement. Status always starts as proposed.
#[derive(Debug, Clone)]
pub struct CreateEngagement {
    pub user_id: DbId,
    pub counterparty_name: String,
    pub amount: Decimal,
    pub deadline: NaiveDate,
    pub description: String,
    pub display_name: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEngagement {
    pub counterparty_name: Option<String>,
    pub amount: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// Listing filter. Limit and offset are clamped by the repository.
#[derive(Debug, Clone, Default)]
pub struct EngagementFilter {
    pub status: Option<String>,
    pub deadline_from: Option<NaiveDate>,
    pub deadline_to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
