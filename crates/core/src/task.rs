//! Task extension attached to an engagement, and the todo ranking.
//!
//! An engagement may carry at most one task. The task holds its own title,
//! due date, priority, importance and completion state; the engagement it
//! belongs to is untouched by anything here.

use std::cmp::{Ordering, Reverse};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";

pub const VALID_PRIORITIES: &[&str] = &[PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_HIGH];

pub const STATE_PENDING: &str = "pending";
pub const STATE_COMPLETED: &str = "completed";

pub const VALID_TASK_STATES: &[&str] = &[STATE_PENDING, STATE_COMPLETED];

pub const MIN_IMPORTANCE: i16 = 1;
pub const MAX_IMPORTANCE: i16 = 5;

/// Maximum length of a task title.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a task description.
pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 1000;

/// A task due within this many days of today (inclusive) counts as urgent
/// for ranking. Overdue tasks are urgent too.
pub const URGENT_WITHIN_DAYS: i64 = 3;

// ---------------------------------------------------------------------------
// Priority and state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            PRIORITY_LOW => Ok(Self::Low),
            PRIORITY_MEDIUM => Ok(Self::Medium),
            PRIORITY_HIGH => Ok(Self::High),
            _ => Err(CoreError::Validation(format!(
                "Invalid priority '{s}'. Must be one of: {}",
                VALID_PRIORITIES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => PRIORITY_LOW,
            Self::Medium => PRIORITY_MEDIUM,
            Self::High => PRIORITY_HIGH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Pending,
    Completed,
}

impl TaskState {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATE_PENDING => Ok(Self::Pending),
            STATE_COMPLETED => Ok(Self::Completed),
            _ => Err(CoreError::InvalidStatus(format!(
                "'{s}' is not a task state. Must be one of: {}",
                VALID_TASK_STATES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATE_PENDING,
            Self::Completed => STATE_COMPLETED,
        }
    }

    /// Pending becomes completed and completed becomes pending.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

/// Check an importance score is within `1..=5`.
pub fn validate_importance(importance: i16) -> Result<i16, CoreError> {
    if (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&importance) {
        Ok(importance)
    } else {
        Err(CoreError::Validation(format!(
            "importance must be between {MIN_IMPORTANCE} and {MAX_IMPORTANCE}"
        )))
    }
}

/// Display label for an importance score. Absent or out-of-range scores
/// read as "normal".
pub fn importance_label(importance: Option<i16>) -> &'static str {
    match importance {
        Some(1) => "very low",
        Some(2) => "low",
        Some(3) => "normal",
        Some(4) => "high",
        Some(5) => "very high",
        _ => "normal",
    }
}

// ---------------------------------------------------------------------------
// Urgency
// ---------------------------------------------------------------------------

/// Fine-grained urgency used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl UrgencyLevel {
    /// `critical` at one day or less (overdue included), `high` within
    /// three, `medium` within seven, otherwise `low`.
    pub fn classify(due_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(due) = due_date else {
            return Self::Low;
        };
        match (due - today).num_days() {
            d if d <= 1 => Self::Critical,
            d if d <= 3 => Self::High,
            d if d <= 7 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Coarse ranking bucket: `0` when due on or before `today + 3`, `1` when
/// later or undated.
pub fn urgency_bucket(due_date: Option<NaiveDate>, today: NaiveDate) -> u8 {
    match due_date {
        Some(due) if due <= today + Duration::days(URGENT_WITHIN_DAYS) => 0,
        _ => 1,
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Orderings offered by the todo list. The matrix ordering is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoSort {
    /// Importance descending, then urgency bucket.
    #[default]
    UrgencyImportanceMatrix,
    /// Counterparty name ascending.
    Sponsor,
    /// Task due date ascending, undated last.
    Deadline,
    /// Newest first.
    Created,
}

impl TodoSort {
    /// Unknown values fall back to newest first.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "urgency_importance_matrix" => Self::UrgencyImportanceMatrix,
            "sponsor" => Self::Sponsor,
            "deadline" => Self::Deadline,
            _ => Self::Created,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrgencyImportanceMatrix => "urgency_importance_matrix",
            Self::Sponsor => "sponsor",
            Self::Deadline => "deadline",
            Self::Created => "created",
        }
    }
}

/// The fields the ranking needs from a todo row.
pub trait Rankable {
    fn importance(&self) -> Option<i16>;
    fn due_date(&self) -> Option<NaiveDate>;
    fn counterparty_name(&self) -> &str;
    fn created_at(&self) -> Timestamp;
}

/// Sort todos in place. The sort is stable, so callers that load rows in
/// id order get id order among ties.
pub fn rank_todos<T: Rankable>(todos: &mut [T], sort: TodoSort, today: NaiveDate) {
    match sort {
        TodoSort::UrgencyImportanceMatrix => todos.sort_by_key(|t| {
            (
                Reverse(t.importance().unwrap_or(0)),
                urgency_bucket(t.due_date(), today),
            )
        }),
        TodoSort::Sponsor => todos.sort_by(|a, b| a.counterparty_name().cmp(b.counterparty_name())),
        TodoSort::Deadline => todos.sort_by(|a, b| cmp_due_dates(a.due_date(), b.due_date())),
        TodoSort::Created => todos.sort_by_key(|t| Reverse(t.created_at())),
    }
}

fn cmp_due_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Clone)]
    struct Item {
        label: &'static str,
        importance: Option<i16>,
        due: Option<NaiveDate>,
        sponsor: &'static str,
        created_secs: i64,
    }

    impl Rankable for Item {
        fn importance(&self) -> Option<i16> {
            self.importance
        }
        fn due_date(&self) -> Option<NaiveDate> {
            self.due
        }
        fn counterparty_name(&self) -> &str {
            self.sponsor
        }
        fn created_at(&self) -> Timestamp {
            Utc.timestamp_opt(self.created_secs, 0).unwrap()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
    }

    fn item(label: &'static str, importance: Option<i16>, due_in: Option<i64>) -> Item {
        Item {
            label,
            importance,
            due: due_in.map(|d| today() + Duration::days(d)),
            sponsor: label,
            created_secs: 0,
        }
    }

    fn labels(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.label).collect()
    }

    #[test]
    fn importance_dominates_urgency() {
        let mut items = vec![
            item("today/imp5", Some(5), Some(0)),
            item("+10d/imp5", Some(5), Some(10)),
            item("today/imp1", Some(1), Some(0)),
        ];
        items.reverse();
        rank_todos(&mut items, TodoSort::UrgencyImportanceMatrix, today());
        assert_eq!(labels(&items), ["today/imp5", "+10d/imp5", "today/imp1"]);
    }

    #[test]
    fn missing_importance_ranks_last() {
        let mut items = vec![
            item("none", None, Some(0)),
            item("one", Some(1), Some(30)),
        ];
        rank_todos(&mut items, TodoSort::UrgencyImportanceMatrix, today());
        assert_eq!(labels(&items), ["one", "none"]);
    }

    #[test]
    fn matrix_is_stable_within_bucket() {
        let mut items = vec![
            item("a", Some(3), Some(2)),
            item("b", Some(3), Some(0)),
            item("c", Some(3), Some(1)),
        ];
        rank_todos(&mut items, TodoSort::UrgencyImportanceMatrix, today());
        assert_eq!(labels(&items), ["a", "b", "c"]);
    }

    #[test]
    fn urgency_bucket_boundaries() {
        assert_eq!(urgency_bucket(Some(today()), today()), 0);
        assert_eq!(urgency_bucket(Some(today() + Duration::days(3)), today()), 0);
        assert_eq!(urgency_bucket(Some(today() + Duration::days(4)), today()), 1);
        assert_eq!(urgency_bucket(Some(today() - Duration::days(2)), today()), 0);
        assert_eq!(urgency_bucket(None, today()), 1);
    }

    #[test]
    fn sponsor_sort_is_ascending() {
        let mut items = vec![
            item("Zeta", None, None),
            item("Acme", None, None),
            item("Mori", None, None),
        ];
        rank_todos(&mut items, TodoSort::Sponsor, today());
        assert_eq!(labels(&items), ["Acme", "Mori", "Zeta"]);
    }

    #[test]
    fn deadline_sort_puts_undated_last() {
        let mut items = vec![
            item("undated", None, None),
            item("later", None, Some(5)),
            item("sooner", None, Some(1)),
        ];
        rank_todos(&mut items, TodoSort::Deadline, today());
        assert_eq!(labels(&items), ["sooner", "later", "undated"]);
    }

    #[test]
    fn created_sort_is_newest_first() {
        let mut old = item("old", None, None);
        old.created_secs = 100;
        let mut new = item("new", None, None);
        new.created_secs = 200;
        let mut items = vec![old, new];
        rank_todos(&mut items, TodoSort::Created, today());
        assert_eq!(labels(&items), ["new", "old"]);
    }

    #[test]
    fn urgency_level_thresholds() {
        let at = |d: i64| UrgencyLevel::classify(Some(today() + Duration::days(d)), today());
        assert_eq!(at(-3), UrgencyLevel::Critical);
        assert_eq!(at(1), UrgencyLevel::Critical);
        assert_eq!(at(2), UrgencyLevel::High);
        assert_eq!(at(3), UrgencyLevel::High);
        assert_eq!(at(7), UrgencyLevel::Medium);
        assert_eq!(at(8), UrgencyLevel::Low);
        assert_eq!(UrgencyLevel::classify(None, today()), UrgencyLevel::Low);
    }

    #[test]
    fn importance_labels() {
        assert_eq!(importance_label(Some(1)), "very low");
        assert_eq!(importance_label(Some(5)), "very high");
        assert_eq!(importance_label(Some(9)), "normal");
        assert_eq!(importance_label(None), "normal");
    }

    #[test]
    fn validate_importance_range() {
        assert!(validate_importance(1).is_ok());
        assert!(validate_importance(5).is_ok());
        assert_matches!(validate_importance(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_importance(6), Err(CoreError::Validation(_)));
    }

    #[test]
    fn task_state_toggles() {
        assert_eq!(TaskState::Pending.toggled(), TaskState::Completed);
        assert_eq!(TaskState::Completed.toggled(), TaskState::Pending);
    }

    #[test]
    fn priority_rejects_unknown() {
        assert!(TaskPriority::from_str_value("urgent").is_err());
        assert_eq!(TaskPriority::from_str_value("high").unwrap(), TaskPriority::High);
    }

    #[test]
    fn sort_parsing_falls_back_to_created() {
        assert_eq!(TodoSort::from_str_value("sponsor"), TodoSort::Sponsor);
        assert_eq!(TodoSort::from_str_value("whatever"), TodoSort::Created);
        assert_eq!(TodoSort::default(), TodoSort::UrgencyImportanceMatrix);
    }
}
