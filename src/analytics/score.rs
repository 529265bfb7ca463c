use chrono::NaiveDateTime;

use super::overdue::is_overdue;
use super::types::EmployeeScore;
use crate::date_util::{parse_timestamp, week_start};
use crate::model::{Profile, Task};

const BASE_SCORE: i64 = 100;
const OVERDUE_PENALTY: i64 = 15;
const LATE_PENALTY: i64 = 5;
const WEEKLY_COMPLETION_BONUS: i64 = 2;
const MAX_WEEKLY_BONUS: i64 = 20;

/// Score an employee from live counts.
///
/// `100 - 15*overdue - 5*late + min(2*completed_this_week, 20)`, clamped to
/// `[0, 100]`.
pub fn compute_employee_score(overdue: u64, late: u64, completed_this_week: u64) -> u8 {
    let count = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
    let penalty = count(overdue)
        .saturating_mul(OVERDUE_PENALTY)
        .saturating_add(count(late).saturating_mul(LATE_PENALTY));
    let bonus = count(completed_this_week)
        .saturating_mul(WEEKLY_COMPLETION_BONUS)
        .min(MAX_WEEKLY_BONUS);
    BASE_SCORE
        .saturating_sub(penalty)
        .saturating_add(bonus)
        .clamp(0, 100) as u8
}

/// Whether a completed task was finished at or after `since`.
pub fn completed_since(task: &Task, since: NaiveDateTime) -> bool {
    if !task.is_completed() {
        return false;
    }
    task.completed_at
        .as_deref()
        .and_then(parse_timestamp)
        .is_some_and(|at| at >= since)
}

/// Whether a task was created at or after `since`.
pub fn created_since(task: &Task, since: NaiveDateTime) -> bool {
    parse_timestamp(&task.created_at).is_some_and(|at| at >= since)
}

/// One score per profile, highest first; ties ordered by name.
///
/// Tasks are attributed through `assigned_to`; unassigned tasks count for
/// nobody.
pub fn employee_scores(profiles: &[Profile], tasks: &[Task], now: NaiveDateTime) -> Vec<EmployeeScore> {
    let since = week_start(now);

    let mut scores: Vec<EmployeeScore> = profiles
        .iter()
        .map(|profile| {
            let mut s = EmployeeScore {
                employee_id: profile.id.clone(),
                full_name: profile.full_name.clone(),
                role: profile.role.clone(),
                total_tasks: 0,
                completed_tasks: 0,
                overdue_tasks: 0,
                late_tasks: 0,
                completed_this_week: 0,
                open_estimated_hours: 0.0,
                score: 0,
            };
            for task in tasks
                .iter()
                .filter(|t| t.assigned_to.as_deref() == Some(profile.id.as_str()))
            {
                s.total_tasks += 1;
                if task.is_completed() {
                    s.completed_tasks += 1;
                } else {
                    s.open_estimated_hours += task.estimated_hours.unwrap_or(0.0);
                }
                if is_overdue(task, now) {
                    s.overdue_tasks += 1;
                }
                if task.late_completion {
                    s.late_tasks += 1;
                }
                if completed_since(task, since) {
                    s.completed_this_week += 1;
                }
            }
            s.score = compute_employee_score(s.overdue_tasks, s.late_tasks, s.completed_this_week);
            s
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    scores
}
