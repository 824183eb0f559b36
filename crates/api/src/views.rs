//! JSON projections returned to callers.
//!
//! Each view flattens the stored row and adds the derived display fields so
//! clients never recompute status labels, overdue flags or formatted amounts.

use chrono::NaiveDate;
use influberry_core::engagement::{self, EngagementStatus};
use influberry_core::error::CoreError;
use influberry_core::invoice;
use influberry_core::money::format_yen;
use influberry_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use influberry_core::task::{importance_label, UrgencyLevel};
use influberry_db::models::engagement::Engagement;
use influberry_db::models::invoice::Invoice;
use influberry_db::models::task::{EngagementTask, Todo};
use serde::Serialize;

/// A stored status outside the enumerated set means the row was written
/// behind the engine's back.
fn corrupt_row(entity: &str, id: i64, err: CoreError) -> CoreError {
    CoreError::Internal(format!("{entity} {id} has an unreadable column: {err}"))
}

#[derive(Debug, Serialize)]
pub struct EngagementView {
    #[serde(flatten)]
    pub engagement: Engagement,
    pub amount_formatted: String,
    pub deadline_formatted: String,
    pub status_display: &'static str,
    pub is_overdue: bool,
    pub days_until_deadline: Option<i64>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl EngagementView {
    pub fn new(engagement: Engagement, today: NaiveDate) -> Result<Self, CoreError> {
        let status: EngagementStatus = engagement
            .parsed_status()
            .map_err(|e| corrupt_row("Engagement", engagement.id, e))?;

        Ok(Self {
            amount_formatted: format_yen(engagement.amount),
            deadline_formatted: engagement::format_deadline(engagement.deadline),
            status_display: status.display_label(),
            is_overdue: engagement::is_overdue(status, engagement.deadline, today),
            days_until_deadline: engagement::days_until_deadline(
                status,
                engagement.deadline,
                today,
            ),
            can_edit: status.can_edit(),
            can_delete: status.can_delete(),
            engagement,
        })
    }

    pub fn many(rows: Vec<Engagement>, today: NaiveDate) -> Result<Vec<Self>, CoreError> {
        rows.into_iter().map(|row| Self::new(row, today)).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: EngagementTask,
    pub urgency_level: &'static str,
    pub importance_label: &'static str,
}

impl TaskView {
    pub fn new(task: EngagementTask, today: NaiveDate) -> Result<Self, CoreError> {
        task.parsed_state()
            .map_err(|e| corrupt_row("Task", task.engagement_id, e))?;
        Ok(Self {
            urgency_level: UrgencyLevel::classify(task.due_date, today).as_str(),
            importance_label: importance_label(task.importance),
            task,
        })
    }
}

/// An engagement with its task attached under `task`.
#[derive(Debug, Serialize)]
pub struct TodoView {
    #[serde(flatten)]
    pub engagement: EngagementView,
    pub task: TaskView,
}

impl TodoView {
    pub fn new(todo: Todo, today: NaiveDate) -> Result<Self, CoreError> {
        let task = TaskView::new(todo.task(), today)?;
        Ok(Self {
            engagement: EngagementView::new(todo.engagement, today)?,
            task,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub status_display: &'static str,
    pub is_overdue: bool,
    pub subtotal_formatted: String,
    pub tax_amount_formatted: String,
    pub total_amount_formatted: String,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, today: NaiveDate) -> Result<Self, CoreError> {
        let status = invoice
            .parsed_status()
            .map_err(|e| corrupt_row("Invoice", invoice.id, e))?;

        Ok(Self {
            status_display: status.display_label(),
            is_overdue: invoice::is_overdue(status, invoice.due_date, today),
            subtotal_formatted: format_yen(invoice.subtotal),
            tax_amount_formatted: format_yen(invoice.tax_amount),
            total_amount_formatted: format_yen(invoice.total_amount),
            invoice,
        })
    }

    pub fn many(rows: Vec<Invoice>, today: NaiveDate) -> Result<Vec<Self>, CoreError> {
        rows.into_iter().map(|row| Self::new(row, today)).collect()
    }
}

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T: Serialize> Page<T> {
    /// Reports the same clamped limit/offset the repository applied.
    pub fn new(items: Vec<T>, total: i64, limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            items,
            total,
            limit: clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: clamp_offset(offset),
        }
    }
}
