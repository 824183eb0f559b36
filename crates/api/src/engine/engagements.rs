//! Engagement lifecycle operations.

use chrono::NaiveDate;
use influberry_core::engagement::{
    self, parse_deadline, validate_optional_text, validate_required_text,
    MAX_COUNTERPARTY_NAME_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_DISPLAY_NAME_LENGTH,
    MAX_NOTES_LENGTH,
};
use influberry_core::error::CoreError;
use influberry_core::money::{decimal_from_json, validate_amount};
use influberry_core::types::DbId;
use influberry_db::models::engagement::{
    CreateEngagement, Engagement, EngagementFilter, UpdateEngagement,
};
use influberry_db::repositories::{EngagementRepo, UserRepo};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use super::not_found;
use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /engagements`.
///
/// Required fields default to empty so a missing field is reported as a
/// validation failure naming it.
#[derive(Debug, Default, Deserialize)]
pub struct CreateEngagementRequest {
    #[serde(default, alias = "company_name")]
    pub counterparty_name: String,
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "project_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PUT /engagements/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEngagementRequest {
    #[serde(alias = "company_name")]
    pub counterparty_name: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub deadline: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "project_name")]
    pub display_name: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// Body of `PUT /engagements/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub status: String,
}

fn parse_amount(raw: &serde_json::Value) -> Result<Decimal, CoreError> {
    validate_amount("amount", decimal_from_json("amount", raw)?)
}

fn validate_create(
    user_id: DbId,
    input: &CreateEngagementRequest,
    today: NaiveDate,
) -> Result<CreateEngagement, CoreError> {
    Ok(CreateEngagement {
        user_id,
        counterparty_name: validate_required_text(
            "counterparty_name",
            &input.counterparty_name,
            MAX_COUNTERPARTY_NAME_LENGTH,
        )?,
        amount: parse_amount(&input.amount)?,
        deadline: parse_deadline(&input.deadline, today)?,
        description: validate_required_text(
            "description",
            &input.description,
            MAX_DESCRIPTION_LENGTH,
        )?,
        display_name: validate_optional_text(
            "display_name",
            input.display_name.as_deref(),
            MAX_DISPLAY_NAME_LENGTH,
        )?,
        notes: validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?,
    })
}

fn validate_update(
    input: &UpdateEngagementRequest,
    today: NaiveDate,
) -> Result<UpdateEngagement, CoreError> {
    let counterparty_name = input
        .counterparty_name
        .as_deref()
        .map(|v| validate_required_text("counterparty_name", v, MAX_COUNTERPARTY_NAME_LENGTH))
        .transpose()?;
    let description = input
        .description
        .as_deref()
        .map(|v| validate_required_text("description", v, MAX_DESCRIPTION_LENGTH))
        .transpose()?;
    let status = input
        .status
        .as_deref()
        .map(|s| engagement::EngagementStatus::from_str_value(s.trim()))
        .transpose()?;

    Ok(UpdateEngagement {
        counterparty_name,
        amount: input.amount.as_ref().map(parse_amount).transpose()?,
        deadline: input
            .deadline
            .as_deref()
            .map(|raw| parse_deadline(raw, today))
            .transpose()?,
        description,
        display_name: validate_optional_text(
            "display_name",
            input.display_name.as_deref(),
            MAX_DISPLAY_NAME_LENGTH,
        )?,
        notes: validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LENGTH)?,
        status: status.map(|s| s.as_str().to_string()),
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create a proposed engagement for an active actor.
pub async fn create(
    pool: &PgPool,
    user_id: DbId,
    input: &CreateEngagementRequest,
    today: NaiveDate,
) -> AppResult<Engagement> {
    let create = validate_create(user_id, input, today)?;

    let mut tx = pool.begin().await?;
    UserRepo::find_active(&mut *tx, user_id)
        .await?
        .ok_or_else(|| not_found("User", user_id))?;
    let created = EngagementRepo::create(&mut *tx, &create).await?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        engagement_id = created.id,
        amount = %created.amount,
        "Engagement created",
    );
    Ok(created)
}

pub async fn get(pool: &PgPool, user_id: DbId, id: DbId) -> AppResult<Engagement> {
    EngagementRepo::find_for_user(pool, user_id, id)
        .await?
        .ok_or_else(|| not_found("Engagement", id))
}

/// One page of engagements plus the total matching `filter`.
pub async fn list(
    pool: &PgPool,
    user_id: DbId,
    filter: &EngagementFilter,
) -> AppResult<(Vec<Engagement>, i64)> {
    if let Some(status) = filter.status.as_deref() {
        engagement::EngagementStatus::from_str_value(status)?;
    }
    let items = EngagementRepo::list(pool, user_id, filter).await?;
    let total = EngagementRepo::count(pool, user_id, filter).await?;
    Ok((items, total))
}

pub async fn list_overdue(
    pool: &PgPool,
    user_id: DbId,
    today: NaiveDate,
) -> AppResult<Vec<Engagement>> {
    Ok(EngagementRepo::list_overdue(pool, user_id, today).await?)
}

/// Open engagements due within `days` of today. `days` is bounded by
/// [`engagement::MAX_UPCOMING_DAYS`].
pub async fn list_upcoming(
    pool: &PgPool,
    user_id: DbId,
    today: NaiveDate,
    days: i64,
) -> AppResult<Vec<Engagement>> {
    let until = engagement::upcoming_window_end(today, days)?;
    Ok(EngagementRepo::list_upcoming(pool, user_id, today, until).await?)
}

/// Partial update of an engagement that has not been completed.
pub async fn update(
    pool: &PgPool,
    user_id: DbId,
    id: DbId,
    input: &UpdateEngagementRequest,
    today: NaiveDate,
) -> AppResult<Engagement> {
    let changes = validate_update(input, today)?;

    let mut tx = pool.begin().await?;
    let current = EngagementRepo::lock_for_user(&mut *tx, user_id, id)
        .await?
        .ok_or_else(|| not_found("Engagement", id))?;
    if let Err(err) = engagement::ensure_editable(current.parsed_status()?) {
        tracing::warn!(user_id, engagement_id = id, "Edit of completed engagement rejected");
        return Err(err.into());
    }
    let updated = EngagementRepo::update(&mut *tx, id, &changes)
        .await?
        .ok_or_else(|| not_found("Engagement", id))?;
    tx.commit().await?;

    tracing::info!(user_id, engagement_id = id, "Engagement updated");
    Ok(updated)
}

/// Move an engagement to `requested`. Any of the three statuses is
/// reachable from any other.
pub async fn transition(
    pool: &PgPool,
    user_id: DbId,
    id: DbId,
    requested: &str,
) -> AppResult<Engagement> {
    let mut tx = pool.begin().await?;
    let current = EngagementRepo::lock_for_user(&mut *tx, user_id, id)
        .await?
        .ok_or_else(|| not_found("Engagement", id))?;
    let from = current.parsed_status()?;
    let to = engagement::transition(from, requested)?;
    let updated = EngagementRepo::set_status(&mut *tx, id, to.as_str())
        .await?
        .ok_or_else(|| not_found("Engagement", id))?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        engagement_id = id,
        from = from.as_str(),
        to = to.as_str(),
        "Engagement status changed",
    );
    Ok(updated)
}

/// Delete a proposed engagement. Its invoice and task go with it.
pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let current = EngagementRepo::lock_for_user(&mut *tx, user_id, id)
        .await?
        .ok_or_else(|| not_found("Engagement", id))?;
    if let Err(err) = engagement::ensure_deletable(current.parsed_status()?) {
        tracing::warn!(
            user_id,
            engagement_id = id,
            status = %current.status,
            "Engagement deletion rejected",
        );
        return Err(err.into());
    }
    EngagementRepo::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(user_id, engagement_id = id, "Engagement deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
    }

    fn request(amount: serde_json::Value) -> CreateEngagementRequest {
        CreateEngagementRequest {
            counterparty_name: " Acme Cosmetics ".to_string(),
            amount,
            deadline: "2025-10-31".to_string(),
            description: "Two sponsored posts".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_trims_and_scales() {
        let create = validate_create(1, &request(json!("50000")), today()).unwrap();
        assert_eq!(create.counterparty_name, "Acme Cosmetics");
        assert_eq!(create.amount.to_string(), "50000.00");
        assert_eq!(create.display_name, None);
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        for amount in [json!(0), json!(-1), json!("-0.01")] {
            assert_matches!(
                validate_create(1, &request(amount), today()),
                Err(CoreError::Validation(_))
            );
        }
    }

    #[test]
    fn create_rejects_missing_fields() {
        let err = validate_create(1, &CreateEngagementRequest::default(), today()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("counterparty_name"));
    }

    #[test]
    fn create_rejects_bad_deadline() {
        let mut input = request(json!(100));
        input.deadline = "31/10/2025".to_string();
        assert_matches!(
            validate_create(1, &input, today()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn update_rejects_unknown_status() {
        let input = UpdateEngagementRequest {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert_matches!(
            validate_update(&input, today()),
            Err(CoreError::InvalidStatus(_))
        );
    }

    #[test]
    fn update_leaves_absent_fields_unset() {
        let input = UpdateEngagementRequest {
            notes: Some("call back Monday".to_string()),
            ..Default::default()
        };
        let changes = validate_update(&input, today()).unwrap();
        assert_eq!(changes.notes.as_deref(), Some("call back Monday"));
        assert!(changes.amount.is_none());
        assert!(changes.status.is_none());
    }
}
