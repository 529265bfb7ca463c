use super::types::DurationStats;
use crate::date_util::days_between;
use crate::model::{Issue, StatusDomain, Task};

/// Days from creation to completion for every completed task with usable dates.
/// Both ends count by their local calendar date.
pub fn task_lead_times(tasks: &[Task]) -> DurationStats {
    let days: Vec<i32> = tasks
        .iter()
        .filter(|t| t.is_completed())
        .filter_map(|t| days_between(&t.created_at, t.completed_at.as_deref()?))
        .filter(|d| *d >= 0)
        .collect();
    stats_from_days(days)
}

/// Days from report to resolution for resolved or closed issues.
pub fn issue_resolution_times(issues: &[Issue]) -> DurationStats {
    let days: Vec<i32> = issues
        .iter()
        .filter(|i| i.status.is_done())
        .filter_map(|i| days_between(&i.created_at, i.resolved_at.as_deref()?))
        .filter(|d| *d >= 0)
        .collect();
    stats_from_days(days)
}

pub(crate) fn stats_from_days(mut days: Vec<i32>) -> DurationStats {
    if days.is_empty() {
        return DurationStats::default();
    }
    days.sort_unstable();

    let sum: i64 = days.iter().map(|&d| d as i64).sum();
    let avg = sum as f64 / days.len() as f64;

    #[allow(clippy::manual_is_multiple_of)]
    let median = if days.len() % 2 == 0 {
        let mid = days.len() / 2;
        (days[mid - 1] as f64 + days[mid] as f64) / 2.0
    } else {
        days[days.len() / 2] as f64
    };

    let p90_idx = ((days.len() as f64) * 0.9).ceil() as usize;
    let p90_idx = p90_idx.min(days.len()).max(1) - 1;
    let p90 = days[p90_idx] as f64;

    DurationStats {
        samples: days.len() as u64,
        avg_days: Some(avg),
        median_days: Some(median),
        p90_days: Some(p90),
        min_days: days.first().copied(),
        max_days: days.last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueStatus, Priority, TaskStatus};

    #[test]
    fn test_stats_empty() {
        let s = stats_from_days(vec![]);
        assert_eq!(s.samples, 0);
        assert!(s.avg_days.is_none());
        assert!(s.median_days.is_none());
        assert!(s.p90_days.is_none());
    }

    #[test]
    fn test_stats_single_element() {
        let s = stats_from_days(vec![5]);
        assert_eq!(s.avg_days, Some(5.0));
        assert_eq!(s.median_days, Some(5.0));
        assert_eq!(s.p90_days, Some(5.0));
        assert_eq!(s.min_days, Some(5));
        assert_eq!(s.max_days, Some(5));
    }

    #[test]
    fn test_stats_unsorted_input() {
        let s = stats_from_days(vec![7, 3]);
        assert_eq!(s.median_days, Some(5.0));
        assert_eq!(s.min_days, Some(3));
        assert_eq!(s.max_days, Some(7));
    }

    #[test]
    fn test_stats_many_elements() {
        let s = stats_from_days((1..=100).rev().collect());
        assert_eq!(s.samples, 100);
        assert_eq!(s.avg_days, Some(50.5));
        assert_eq!(s.median_days, Some(50.5));
        assert_eq!(s.p90_days, Some(90.0));
    }

    #[test]
    fn test_task_lead_times_skip_open_and_undated() {
        let mut done = Task::new("t1", "a", "2025-01-01T09:00:00");
        done.status = TaskStatus::Completed;
        done.completed_at = Some("2025-01-10T17:00:00".to_string());

        let mut no_date = Task::new("t2", "b", "2025-01-01");
        no_date.status = TaskStatus::Completed;

        let mut open = Task::new("t3", "c", "2025-01-01");
        open.completed_at = Some("2025-01-02".to_string());

        let s = task_lead_times(&[done, no_date, open]);
        assert_eq!(s.samples, 1);
        assert_eq!(s.avg_days, Some(9.0));
    }

    #[test]
    fn test_issue_resolution_times() {
        let issue = |status: IssueStatus, resolved_at: Option<&str>| Issue {
            id: "i".to_string(),
            title: "i".to_string(),
            description: None,
            status,
            priority: Priority::Low,
            reported_by: None,
            suggested_assignee_id: None,
            assigned_to: None,
            converted_task_id: None,
            created_at: "2025-01-01".to_string(),
            resolved_at: resolved_at.map(str::to_string),
        };
        let s = issue_resolution_times(&[
            issue(IssueStatus::Resolved, Some("2025-01-03")),
            issue(IssueStatus::Closed, Some("2025-01-05")),
            issue(IssueStatus::Assigned, Some("2025-01-09")),
        ]);
        assert_eq!(s.samples, 2);
        assert_eq!(s.avg_days, Some(3.0));
        assert_eq!(s.max_days, Some(4));
    }
}
