use std::collections::BTreeMap;

use super::rate_percent;
use super::types::Breakdown;
use crate::model::{Issue, IssueStatus, Priority, StatusDomain, Task, TaskStatus};

/// A record that can be bucketed by priority and status.
pub trait Triaged {
    type Status: StatusDomain;

    fn priority(&self) -> Priority;
    fn status(&self) -> Self::Status;
}

impl Triaged for Task {
    type Status = TaskStatus;

    fn priority(&self) -> Priority {
        self.priority
    }

    fn status(&self) -> TaskStatus {
        self.status
    }
}

impl Triaged for Issue {
    type Status = IssueStatus;

    fn priority(&self) -> Priority {
        self.priority
    }

    fn status(&self) -> IssueStatus {
        self.status
    }
}

/// Count `items` into priority and status histograms.
///
/// Both maps start with every domain value at zero. Values outside the domain
/// are skipped in the histograms but still count toward `total`.
pub fn aggregate_by_priority_and_status<T: Triaged>(items: &[T]) -> Breakdown<T::Status> {
    let mut by_priority: BTreeMap<Priority, u64> =
        Priority::ALL.iter().map(|p| (*p, 0)).collect();
    let mut by_status: BTreeMap<T::Status, u64> =
        <T::Status as StatusDomain>::ALL.iter().map(|s| (*s, 0)).collect();
    let mut completed = 0u64;

    for item in items {
        if let Some(n) = by_priority.get_mut(&item.priority()) {
            *n += 1;
        }
        let status = item.status();
        if let Some(n) = by_status.get_mut(&status) {
            *n += 1;
        }
        if status.is_done() {
            completed += 1;
        }
    }

    let total = items.len() as u64;
    Breakdown {
        total,
        completed,
        by_priority,
        by_status,
        completion_rate: rate_percent(completed, total),
    }
}
