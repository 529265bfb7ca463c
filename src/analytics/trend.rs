use chrono::{Duration, NaiveDateTime};

use super::types::TrendPoint;
use crate::date_util::local_date;
use crate::model::Task;
use crate::query::window::MAX_WINDOW_DAYS;

/// Daily created/completed counts for the `days` calendar days ending on
/// `now`'s date, oldest first. Every day is present. `days` is capped at
/// [`MAX_WINDOW_DAYS`].
///
/// `created` keys on the local date of `created_at`; `completed` keys on the
/// local date of `completed_at` and only counts completed tasks. Dates that
/// do not parse are left out.
pub fn bucket_trend(tasks: &[Task], days: u32, now: NaiveDateTime) -> Vec<TrendPoint> {
    let days = days.min(MAX_WINDOW_DAYS);
    if days == 0 {
        return Vec::new();
    }
    let end = now.date();
    let Some(start) = end.checked_sub_signed(Duration::days(i64::from(days) - 1)) else {
        return Vec::new();
    };

    let mut points: Vec<TrendPoint> = start
        .iter_days()
        .take(days as usize)
        .map(|date| TrendPoint {
            date: date.format("%Y-%m-%d").to_string(),
            created: 0,
            completed: 0,
        })
        .collect();

    let slot = |date: chrono::NaiveDate| -> Option<usize> {
        if date < start || date > end {
            return None;
        }
        Some((date - start).num_days() as usize)
    };

    for task in tasks {
        if let Some(i) = local_date(&task.created_at).and_then(slot) {
            points[i].created += 1;
        }
        if !task.is_completed() {
            continue;
        }
        if let Some(i) = task
            .completed_at
            .as_deref()
            .and_then(local_date)
            .and_then(slot)
        {
            points[i].completed += 1;
        }
    }

    points
}
