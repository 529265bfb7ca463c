use chrono::NaiveDateTime;

use crate::date_util::{end_of_day, parse_date, parse_time_of_day};
use crate::model::{Task, TaskStatus};

/// Anything with a due date that can become overdue.
pub trait Deadline {
    fn due_date(&self) -> Option<&str>;
    fn end_time(&self) -> Option<&str>;
    fn is_completed(&self) -> bool;
}

impl Deadline for Task {
    fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// A borrowed `{due_date, end_time?, status}` triple, for callers that do not
/// hold a full [`Task`].
#[derive(Debug, Clone, Copy)]
pub struct DeadlineRecord<'a> {
    pub due_date: Option<&'a str>,
    pub end_time: Option<&'a str>,
    pub status: TaskStatus,
}

impl Deadline for DeadlineRecord<'_> {
    fn due_date(&self) -> Option<&str> {
        self.due_date
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time
    }

    fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// The instant after which an item is overdue.
///
/// With an `end_time` the deadline is that wall-clock time on the due date;
/// otherwise it is 23:59:59.999 of the due date. An `end_time` that does not
/// parse is treated as absent.
pub fn deadline_of(due_date: &str, end_time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_date(due_date)?;
    match end_time.filter(|t| !t.trim().is_empty()) {
        Some(raw) => match parse_time_of_day(raw) {
            Some(t) => Some(date.and_time(t)),
            None => {
                log::debug!("ignoring unparseable end_time {raw:?}");
                Some(end_of_day(date))
            }
        },
        None => Some(end_of_day(date)),
    }
}

/// Whether `item` is overdue at `now`. Completed items and items without a
/// parseable due date never are.
pub fn is_overdue<D: Deadline + ?Sized>(item: &D, now: NaiveDateTime) -> bool {
    if item.is_completed() {
        return false;
    }
    let Some(due) = item.due_date() else {
        return false;
    };
    match deadline_of(due, item.end_time()) {
        Some(deadline) => now > deadline,
        None => {
            log::debug!("treating unparseable due_date {due:?} as not overdue");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, min, s, ms)
            .unwrap()
    }

    fn due(date: &str, end_time: Option<&str>) -> Task {
        let mut t = Task::new("t1", "Due task", "2024-01-01");
        t.due_date = Some(date.to_string());
        t.end_time = end_time.map(str::to_string);
        t
    }

    #[test]
    fn test_end_of_day_boundary() {
        let task = due("2024-01-10", None);
        assert!(!is_overdue(&task, at(2024, 1, 10, 23, 59, 59, 998)));
        assert!(!is_overdue(&task, at(2024, 1, 10, 23, 59, 59, 999)));
        assert!(is_overdue(&task, at(2024, 1, 11, 0, 0, 0, 0)));
    }

    #[test]
    fn test_end_time_boundary() {
        let task = due("2024-01-10", Some("17:00"));
        assert!(!is_overdue(&task, at(2024, 1, 10, 16, 59, 59, 0)));
        assert!(!is_overdue(&task, at(2024, 1, 10, 17, 0, 0, 0)));
        assert!(is_overdue(&task, at(2024, 1, 10, 17, 0, 0, 1)));
        assert!(is_overdue(&task, at(2024, 1, 10, 17, 0, 1, 0)));
    }

    #[test]
    fn test_embedded_time_in_due_date_is_ignored() {
        let task = due("2024-01-10T08:00:00Z", None);
        assert!(!is_overdue(&task, at(2024, 1, 10, 12, 0, 0, 0)));
        assert!(is_overdue(&task, at(2024, 1, 11, 0, 0, 0, 0)));
    }

    #[test]
    fn test_completed_never_overdue() {
        let mut task = due("2020-01-01", None);
        task.status = TaskStatus::Completed;
        assert!(!is_overdue(&task, at(2024, 1, 1, 0, 0, 0, 0)));
    }

    #[test]
    fn test_missing_or_bad_due_date_not_overdue() {
        let task = Task::new("t1", "No due date", "2024-01-01");
        assert!(!is_overdue(&task, at(2030, 1, 1, 0, 0, 0, 0)));

        let task = due("someday", None);
        assert!(!is_overdue(&task, at(2030, 1, 1, 0, 0, 0, 0)));
    }

    #[test]
    fn test_bad_end_time_falls_back_to_end_of_day() {
        let task = due("2024-01-10", Some("after lunch"));
        assert!(!is_overdue(&task, at(2024, 1, 10, 20, 0, 0, 0)));
        assert!(is_overdue(&task, at(2024, 1, 11, 0, 0, 0, 0)));
    }

    #[test]
    fn test_deadline_record() {
        let record = DeadlineRecord {
            due_date: Some("2024-01-10"),
            end_time: Some("09:30:00"),
            status: TaskStatus::InProgress,
        };
        assert!(is_overdue(&record, at(2024, 1, 10, 9, 30, 1, 0)));

        let done = DeadlineRecord {
            status: TaskStatus::Completed,
            ..record
        };
        assert!(!is_overdue(&done, at(2024, 1, 10, 9, 30, 1, 0)));
    }
}
