//! Row types read from the task store.
//!
//! Dates and times stay as the strings the store returns. Parsing happens in
//! the analytics layer so a single malformed row degrades instead of failing a
//! whole fetch.

use serde::{Deserialize, Serialize};

/// Task and issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
    /// A value outside the known domain. Never counted in histograms.
    #[serde(other)]
    Unknown,
}

impl Priority {
    pub const ALL: &'static [Priority] = &[
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
            Priority::Unknown => "unknown",
        }
    }
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            "critical" => Priority::Critical,
            _ => Priority::Unknown,
        }
    }
}

/// A closed status domain that histograms are pre-seeded with.
pub trait StatusDomain: Copy + Ord + Serialize + 'static {
    /// Every known value, in display order. Excludes the unknown catch-all.
    const ALL: &'static [Self];

    /// Whether the status counts as done for completion rates.
    fn is_done(self) -> bool;

    fn as_str(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
    #[serde(other)]
    Unknown,
}

impl StatusDomain for TaskStatus {
    const ALL: &'static [TaskStatus] = &[
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];

    fn is_done(self) -> bool {
        self == TaskStatus::Completed
    }

    fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Unknown => "unknown",
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_started" => TaskStatus::NotStarted,
            "in_progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            "blocked" => TaskStatus::Blocked,
            _ => TaskStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    PendingAssignment,
    Assigned,
    InProgress,
    Resolved,
    Closed,
    #[serde(other)]
    Unknown,
}

impl StatusDomain for IssueStatus {
    const ALL: &'static [IssueStatus] = &[
        IssueStatus::PendingAssignment,
        IssueStatus::Assigned,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
    ];

    fn is_done(self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Closed)
    }

    fn as_str(self) -> &'static str {
        match self {
            IssueStatus::PendingAssignment => "pending_assignment",
            IssueStatus::Assigned => "assigned",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
            IssueStatus::Unknown => "unknown",
        }
    }
}

impl From<&str> for IssueStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending_assignment" => IssueStatus::PendingAssignment,
            "assigned" => IssueStatus::Assigned,
            "in_progress" => IssueStatus::InProgress,
            "resolved" => IssueStatus::Resolved,
            "closed" => IssueStatus::Closed,
            _ => IssueStatus::Unknown,
        }
    }
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// A unit of assigned work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Calendar date; any embedded time component is ignored.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Wall-clock deadline on `due_date`, `HH:MM[:SS]`.
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub late_completion: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub is_recurring: bool,
    /// `daily`, `weekly`, `monthly`; informational only.
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    pub created_at: String,
}

impl Task {
    /// A minimal open task, used by importers and tests.
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            due_date: None,
            end_time: None,
            completed_at: None,
            late_completion: false,
            tags: Vec::new(),
            assigned_to: None,
            created_by: None,
            estimated_hours: None,
            is_recurring: false,
            recurrence_pattern: None,
            created_at: created_at.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// A reported problem awaiting triage or conversion into a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: IssueStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub suggested_assignee_id: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Set once an admin has converted the issue into a task.
    #[serde(default)]
    pub converted_task_id: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

/// An employee profile. Scores are derived per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub job_description: Option<String>,
}

fn default_role() -> String {
    "employee".to_string()
}
