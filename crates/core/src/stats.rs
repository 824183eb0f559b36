//! Output shapes for the per-actor dashboards.
//!
//! The numbers are produced by single aggregate queries in the database
//! layer; this module only defines what the caller receives and derives the
//! formatted amount strings.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::format_yen;

/// Engagement counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub proposed: i64,
    pub contracted: i64,
    pub completed: i64,
}

impl StatusBreakdown {
    pub fn total(&self) -> i64 {
        self.proposed + self.contracted + self.completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementSummary {
    pub total: i64,
    pub by_status: StatusBreakdown,
    /// Sum of amounts on completed engagements.
    pub total_earnings: Decimal,
    /// Sum of amounts across every status.
    pub total_potential: Decimal,
    pub total_earnings_formatted: String,
    pub total_potential_formatted: String,
}

impl EngagementSummary {
    pub fn new(
        total: i64,
        by_status: StatusBreakdown,
        total_earnings: Decimal,
        total_potential: Decimal,
    ) -> Self {
        Self {
            total,
            by_status,
            total_earnings,
            total_potential,
            total_earnings_formatted: format_yen(total_earnings),
            total_potential_formatted: format_yen(total_potential),
        }
    }
}

/// Invoice counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceStatusBreakdown {
    pub draft: i64,
    pub sent: i64,
    pub paid: i64,
    pub overdue: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub total: i64,
    pub by_status: InvoiceStatusBreakdown,
    /// Sum of `total_amount` over paid invoices.
    pub total_paid_amount: Decimal,
    pub total_paid_formatted: String,
    /// Invoices whose issue date falls in the current calendar month.
    pub this_month: i64,
}

impl InvoiceSummary {
    pub fn new(
        total: i64,
        by_status: InvoiceStatusBreakdown,
        total_paid_amount: Decimal,
        this_month: i64,
    ) -> Self {
        Self {
            total,
            by_status,
            total_paid_amount,
            total_paid_formatted: format_yen(total_paid_amount),
            this_month,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodoSummary {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    /// Pending tasks due today.
    pub due_today: i64,
    /// Pending tasks due between today and three days out, inclusive.
    pub due_soon: i64,
    /// Pending tasks with `high` priority.
    pub high_priority: i64,
}

/// First day of the month containing `today`.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_summary_formats_amounts() {
        let summary = EngagementSummary::new(
            3,
            StatusBreakdown {
                proposed: 1,
                contracted: 1,
                completed: 1,
            },
            Decimal::from(30_000),
            Decimal::from(60_000),
        );
        assert_eq!(summary.by_status.total(), summary.total);
        assert_eq!(summary.total_earnings_formatted, "¥30,000");
        assert_eq!(summary.total_potential_formatted, "¥60,000");
    }

    #[test]
    fn invoice_summary_formats_paid_total() {
        let summary = InvoiceSummary::new(
            2,
            InvoiceStatusBreakdown {
                paid: 1,
                draft: 1,
                ..Default::default()
            },
            "11000.00".parse().unwrap(),
            2,
        );
        assert_eq!(summary.total_paid_formatted, "¥11,000");
    }

    #[test]
    fn month_start_is_first_day() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert_eq!(month_start(today), NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }
}
