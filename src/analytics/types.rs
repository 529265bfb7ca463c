use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{IssueStatus, Priority, TaskStatus};

/// Fixed-shape histogram over the priority domain and one status domain.
/// Every domain value is present, zero or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown<S: Ord> {
    pub total: u64,
    pub completed: u64,
    pub by_priority: BTreeMap<Priority, u64>,
    pub by_status: BTreeMap<S, u64>,
    /// `round(completed / total * 100)`, 0 for an empty input.
    pub completion_rate: u32,
}

/// Per-tag counters. A task with several tags counts fully toward each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStats {
    pub tag: String,
    pub total: u64,
    pub completed: u64,
    pub active: u64,
    pub overdue: u64,
    pub completion_rate: u32,
    pub overdue_rate: u32,
}

/// A tag whose overdue share crossed the alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblematicTag {
    pub tag: String,
    pub total: u64,
    pub overdue: u64,
    pub overdue_rate: u32,
}

/// One day of the created/completed time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub created: u64,
    pub completed: u64,
}

/// Derived, non-persisted performance view of one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeScore {
    pub employee_id: String,
    pub full_name: String,
    pub role: String,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub overdue_tasks: u64,
    pub late_tasks: u64,
    pub completed_this_week: u64,
    /// Sum of `estimated_hours` over tasks not yet completed.
    pub open_estimated_hours: f64,
    pub score: u8,
}

/// Distribution of whole days between creation and completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DurationStats {
    pub samples: u64,
    pub avg_days: Option<f64>,
    pub median_days: Option<f64>,
    pub p90_days: Option<f64>,
    pub min_days: Option<i32>,
    pub max_days: Option<i32>,
}

/// Headline task counts for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskTotals {
    pub total_tasks: u64,
    pub overdue_tasks: u64,
    pub recurring_tasks: u64,
    pub completed_this_week: u64,
    pub created_this_week: u64,
    pub open_estimated_hours: f64,
}

/// Issue triage view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueMetrics {
    pub breakdown: Breakdown<IssueStatus>,
    /// Issues still waiting for an admin to assign them.
    pub awaiting_triage: u64,
    /// Issues already converted into tasks.
    pub converted: u64,
    pub resolution_time: DurationStats,
}

/// Everything the analytics dashboard shows, computed in one pass per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardAnalytics {
    pub generated_at: String,
    /// Assignee the dashboard is scoped to, if any.
    pub scope: Option<String>,
    pub trend_days: u32,
    pub totals: TaskTotals,
    pub tasks: Breakdown<TaskStatus>,
    pub issues: IssueMetrics,
    pub tags: Vec<TagStats>,
    pub problematic_tags: Vec<ProblematicTag>,
    pub trend: Vec<TrendPoint>,
    pub employees: Vec<EmployeeScore>,
    pub lead_time: DurationStats,
    pub insights: Vec<String>,
}
