//! Task extension rows and the joined todo projection.

use chrono::NaiveDate;
use influberry_core::error::CoreError;
use influberry_core::task::{Rankable, TaskPriority, TaskState};
use influberry_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::engagement::Engagement;

/// A row from the `engagement_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EngagementTask {
    pub engagement_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub importance: Option<i16>,
    pub state: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EngagementTask {
    pub fn parsed_state(&self) -> Result<TaskState, CoreError> {
        TaskState::from_str_value(&self.state)
    }

    pub fn parsed_priority(&self) -> Result<Option<TaskPriority>, CoreError> {
        self.priority
            .as_deref()
            .map(TaskPriority::from_str_value)
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct CreateEngagementTask {
    pub engagement_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub importance: Option<i16>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEngagementTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub importance: Option<i16>,
}

/// Todo list filter. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub state: Option<String>,
    pub priority: Option<String>,
    pub importance: Option<i16>,
}

/// An engagement joined with its task. Task columns are aliased with a
/// `task_` prefix so they do not collide with the engagement's own.
#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    #[sqlx(flatten)]
    pub engagement: Engagement,
    pub task_title: String,
    pub task_description: Option<String>,
    pub task_due_date: Option<NaiveDate>,
    pub task_priority: Option<String>,
    pub task_importance: Option<i16>,
    pub task_state: String,
    pub task_created_at: Timestamp,
    pub task_updated_at: Timestamp,
}

impl Todo {
    /// The task half of the row as its own value.
    pub fn task(&self) -> EngagementTask {
        EngagementTask {
            engagement_id: self.engagement.id,
            title: self.task_title.clone(),
            description: self.task_description.clone(),
            due_date: self.task_due_date,
            priority: self.task_priority.clone(),
            importance: self.task_importance,
            state: self.task_state.clone(),
            created_at: self.task_created_at,
            updated_at: self.task_updated_at,
        }
    }
}

impl Rankable for Todo {
    fn importance(&self) -> Option<i16> {
        self.task_importance
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.task_due_date
    }

    fn counterparty_name(&self) -> &str {
        &self.engagement.counterparty_name
    }

    fn created_at(&self) -> Timestamp {
        self.engagement.created_at
    }
}
