//! Read-side analytics over task, issue, and profile snapshots.
//!
//! Every function here is a synchronous fold over rows already in memory.
//! Nothing is cached or persisted at this layer; see [`crate::cache`] for the
//! response cache that sits in front of [`load_dashboard`].

pub mod breakdown;
pub mod insights;
pub mod lead_time;
pub mod overdue;
pub mod score;
pub mod tags;
pub mod trend;
pub mod types;

pub use breakdown::{aggregate_by_priority_and_status, Triaged};
pub use insights::{derive_insights, InsightInputs};
pub use lead_time::{issue_resolution_times, task_lead_times};
pub use overdue::{deadline_of, is_overdue, Deadline, DeadlineRecord};
pub use score::{compute_employee_score, employee_scores};
pub use tags::{aggregate_by_tag, problematic_tags, UNTAGGED};
pub use trend::bucket_trend;
pub use types::*;

use chrono::NaiveDateTime;

use crate::date_util::week_start;
use crate::error::Result;
use crate::model::{Issue, IssueStatus, Priority, Profile, Task};
use crate::query::window::MAX_WINDOW_DAYS;
use crate::storage::{repository, Database};

pub const DEFAULT_TREND_DAYS: u32 = 30;

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
pub fn rate_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Rows a dashboard is computed from.
#[derive(Debug, Clone, Default)]
pub struct DashboardInput {
    pub profiles: Vec<Profile>,
    pub tasks: Vec<Task>,
    pub issues: Vec<Issue>,
}

/// What to compute and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DashboardOptions {
    /// Restrict tasks, issues, and scores to one assignee.
    pub assignee: Option<String>,
    pub trend_days: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            assignee: None,
            trend_days: DEFAULT_TREND_DAYS,
        }
    }
}

impl DashboardOptions {
    /// Key identifying this dashboard in the response cache.
    pub fn cache_key(&self) -> String {
        format!(
            "dashboard:{}:{}d",
            self.assignee.as_deref().unwrap_or("*"),
            self.trend_days
        )
    }
}

/// Compute the whole dashboard from `input` as of `now`.
pub fn compute_dashboard(
    input: &DashboardInput,
    options: &DashboardOptions,
    now: NaiveDateTime,
) -> DashboardAnalytics {
    let since = week_start(now);
    let trend_days = options.trend_days.min(MAX_WINDOW_DAYS);
    let tasks = &input.tasks;

    let mut totals = TaskTotals {
        total_tasks: tasks.len() as u64,
        ..Default::default()
    };
    for task in tasks {
        if is_overdue(task, now) {
            totals.overdue_tasks += 1;
        }
        if task.is_recurring {
            totals.recurring_tasks += 1;
        }
        if score::completed_since(task, since) {
            totals.completed_this_week += 1;
        }
        if score::created_since(task, since) {
            totals.created_this_week += 1;
        }
        if !task.is_completed() {
            totals.open_estimated_hours += task.estimated_hours.unwrap_or(0.0);
        }
    }

    let task_breakdown = aggregate_by_priority_and_status(tasks);
    let issues = IssueMetrics {
        breakdown: aggregate_by_priority_and_status(&input.issues),
        awaiting_triage: input
            .issues
            .iter()
            .filter(|i| i.status == IssueStatus::PendingAssignment)
            .count() as u64,
        converted: input
            .issues
            .iter()
            .filter(|i| i.converted_task_id.is_some())
            .count() as u64,
        resolution_time: issue_resolution_times(&input.issues),
    };

    let tag_stats = aggregate_by_tag(tasks, now);
    let problems = problematic_tags(&tag_stats);

    let insights = derive_insights(&InsightInputs {
        total_tasks: totals.total_tasks,
        overdue_tasks: totals.overdue_tasks,
        recurring_tasks: totals.recurring_tasks,
        completed_this_week: totals.completed_this_week,
        created_this_week: totals.created_this_week,
        critical_priority_count: task_breakdown
            .by_priority
            .get(&Priority::Critical)
            .copied()
            .unwrap_or(0),
        worst_problematic_tag: problems.first().cloned(),
    });

    DashboardAnalytics {
        generated_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        scope: options.assignee.clone(),
        trend_days,
        totals,
        tasks: task_breakdown,
        issues,
        tags: tag_stats,
        problematic_tags: problems,
        trend: bucket_trend(tasks, trend_days, now),
        employees: employee_scores(&input.profiles, tasks, now),
        lead_time: task_lead_times(tasks),
        insights,
    }
}

/// Fetch the rows a dashboard needs from the store.
pub async fn load_input(db: &Database, assignee: Option<&str>) -> Result<DashboardInput> {
    let assignee = assignee.map(str::to_string);
    let input = db
        .reader()
        .call(move |conn| {
            let tasks = repository::list_tasks(conn, assignee.as_deref())?;
            let mut issues = repository::list_issues(conn)?;
            let mut profiles = repository::list_profiles(conn)?;
            if let Some(who) = assignee.as_deref() {
                issues.retain(|i| i.assigned_to.as_deref() == Some(who));
                profiles.retain(|p| p.id == who);
            }
            Ok::<DashboardInput, rusqlite::Error>(DashboardInput {
                profiles,
                tasks,
                issues,
            })
        })
        .await?;
    log::debug!(
        "loaded {} tasks, {} issues, {} profiles",
        input.tasks.len(),
        input.issues.len(),
        input.profiles.len()
    );
    Ok(input)
}

/// Load rows from the store and compute a dashboard for them.
pub async fn load_dashboard(
    db: &Database,
    options: &DashboardOptions,
    now: NaiveDateTime,
) -> Result<DashboardAnalytics> {
    let input = load_input(db, options.assignee.as_deref()).await?;
    Ok(compute_dashboard(&input, options, now))
}
