//! Engagement lifecycle: status values, edit/delete guards, deadline math and
//! field validation.
//!
//! The three statuses form a fully connected graph. Any status may be set
//! from any other, so a mistakenly completed engagement can be reopened.
//! Billing integrity is protected by the guards instead: completed records
//! are read-only and only proposals may be deleted.

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_PROPOSED: &str = "proposed";
pub const STATUS_CONTRACTED: &str = "contracted";
pub const STATUS_COMPLETED: &str = "completed";

/// All valid engagement status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PROPOSED, STATUS_CONTRACTED, STATUS_COMPLETED];

/// Maximum length of the counterparty (sponsor company) name.
pub const MAX_COUNTERPARTY_NAME_LENGTH: usize = 255;

/// Maximum length of the engagement description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum length of the optional display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;

/// Maximum length of free-form notes.
pub const MAX_NOTES_LENGTH: usize = 2000;

/// How far in the past a deadline may be set, in months.
pub const DEADLINE_PAST_WINDOW_MONTHS: u32 = 12;

/// How far in the future a deadline may be set, in months.
pub const DEADLINE_FUTURE_WINDOW_MONTHS: u32 = 120;

/// Widest look-ahead for the upcoming-deadline listing, in days. Matches the
/// ten-year deadline window.
pub const MAX_UPCOMING_DAYS: i64 = 3660;

/// Default look-ahead for the upcoming-deadline listing, in days.
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Wire format for every calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Human format for deadlines, e.g. `Sep 30, 2025`.
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    #[default]
    Proposed,
    Contracted,
    Completed,
}

impl EngagementStatus {
    /// Convert from a database or request string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_PROPOSED => Ok(Self::Proposed),
            STATUS_CONTRACTED => Ok(Self::Contracted),
            STATUS_COMPLETED => Ok(Self::Completed),
            _ => Err(CoreError::InvalidStatus(format!(
                "'{s}' is not an engagement status. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => STATUS_PROPOSED,
            Self::Contracted => STATUS_CONTRACTED,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::Contracted => "Contracted",
            Self::Completed => "Completed",
        }
    }

    /// Completed engagements are frozen.
    pub fn can_edit(&self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// Only proposals may be deleted; anything further along may already
    /// be referenced by an invoice.
    pub fn can_delete(&self) -> bool {
        matches!(self, Self::Proposed)
    }

    /// Whether work is still outstanding.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

/// Validate a requested status change and return the target status.
///
/// Every target in the status set is reachable from every source, including
/// the current one.
pub fn transition(
    _from: EngagementStatus,
    requested: &str,
) -> Result<EngagementStatus, CoreError> {
    EngagementStatus::from_str_value(requested.trim())
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Reject edits to a completed engagement.
pub fn ensure_editable(status: EngagementStatus) -> Result<(), CoreError> {
    if status.can_edit() {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(
            "completed engagements cannot be edited".to_string(),
        ))
    }
}

/// Reject deletion of anything that has left the proposed state.
pub fn ensure_deletable(status: EngagementStatus) -> Result<(), CoreError> {
    if status.can_delete() {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(format!(
            "only proposed engagements can be deleted (status is {})",
            status.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Deadline math
// ---------------------------------------------------------------------------

/// An open engagement whose deadline has passed.
pub fn is_overdue(status: EngagementStatus, deadline: NaiveDate, today: NaiveDate) -> bool {
    status.is_open() && today > deadline
}

/// Signed days from `today` to `deadline`; `None` once completed.
pub fn days_until_deadline(
    status: EngagementStatus,
    deadline: NaiveDate,
    today: NaiveDate,
) -> Option<i64> {
    status
        .is_open()
        .then(|| (deadline - today).num_days())
}

/// Last deadline included in an upcoming listing `days` ahead of `today`.
pub fn upcoming_window_end(today: NaiveDate, days: i64) -> Result<NaiveDate, CoreError> {
    if !(0..=MAX_UPCOMING_DAYS).contains(&days) {
        return Err(CoreError::Validation(format!(
            "days must be between 0 and {MAX_UPCOMING_DAYS}"
        )));
    }
    today
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| CoreError::Validation("days is out of range".to_string()))
}

pub fn format_deadline(deadline: NaiveDate) -> String {
    deadline.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        CoreError::Validation(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

/// Parse a deadline and check it falls between one year ago and ten years
/// from `today`, inclusive.
pub fn parse_deadline(raw: &str, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let deadline = parse_date("deadline", raw)?;
    validate_deadline_window(deadline, today)?;
    Ok(deadline)
}

pub fn validate_deadline_window(deadline: NaiveDate, today: NaiveDate) -> Result<(), CoreError> {
    let earliest = today
        .checked_sub_months(Months::new(DEADLINE_PAST_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    let latest = today
        .checked_add_months(Months::new(DEADLINE_FUTURE_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX);

    if deadline < earliest {
        return Err(CoreError::Validation(
            "deadline cannot be more than one year in the past".to_string(),
        ));
    }
    if deadline > latest {
        return Err(CoreError::Validation(
            "deadline cannot be more than ten years in the future".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text validation
// ---------------------------------------------------------------------------

/// Trim a required text field and check it is non-empty and within `max`
/// characters.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    check_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Trim an optional text field. Blank input becomes `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, CoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
