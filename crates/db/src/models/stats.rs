//! Raw rows returned by the single-statement aggregate queries.

use influberry_core::stats::{
    EngagementSummary, InvoiceStatusBreakdown, InvoiceSummary, StatusBreakdown, TodoSummary,
};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct EngagementStatsRow {
    pub total: i64,
    pub proposed: i64,
    pub contracted: i64,
    pub completed: i64,
    pub total_earnings: Decimal,
    pub total_potential: Decimal,
}

impl From<EngagementStatsRow> for EngagementSummary {
    fn from(row: EngagementStatsRow) -> Self {
        EngagementSummary::new(
            row.total,
            StatusBreakdown {
                proposed: row.proposed,
                contracted: row.contracted,
                completed: row.completed,
            },
            row.total_earnings,
            row.total_potential,
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceStatsRow {
    pub total: i64,
    pub draft: i64,
    pub sent: i64,
    pub paid: i64,
    pub overdue: i64,
    pub cancelled: i64,
    pub total_paid_amount: Decimal,
    pub this_month: i64,
}

impl From<InvoiceStatsRow> for InvoiceSummary {
    fn from(row: InvoiceStatsRow) -> Self {
        InvoiceSummary::new(
            row.total,
            InvoiceStatusBreakdown {
                draft: row.draft,
                sent: row.sent,
                paid: row.paid,
                overdue: row.overdue,
                cancelled: row.cancelled,
            },
            row.total_paid_amount,
            row.this_month,
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TodoStatsRow {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub due_today: i64,
    pub due_soon: i64,
    pub high_priority: i64,
}

impl From<TodoStatsRow> for TodoSummary {
    fn from(row: TodoStatsRow) -> Self {
        TodoSummary {
            total: row.total,
            pending: row.pending,
            completed: row.completed,
            due_today: row.due_today,
            due_soon: row.due_soon,
            high_priority: row.high_priority,
        }
    }
}
