//! Loading snapshots into the store and writing tasks back out.
//!
//! Two input formats are accepted: a JSON [`Snapshot`] carrying every entity
//! kind, and a flat task CSV using [`CSV_HEADER`]. CSV export writes the same
//! header so an export can be re-imported unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Issue, Priority, Profile, StatusDomain, Task, TaskStatus};
use crate::storage::{repository, Database};

/// Columns of the task CSV format, in export order.
pub const CSV_HEADER: &[&str] = &[
    "id",
    "title",
    "status",
    "priority",
    "due_date",
    "end_time",
    "completed_at",
    "late_completion",
    "tags",
    "assigned_to",
    "estimated_hours",
    "is_recurring",
    "created_at",
];

const TAG_SEPARATOR: char = ';';

/// Every entity kind, as exported from the tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub profiles: u64,
    pub tasks: u64,
    pub issues: u64,
    /// CSV rows that could not be turned into a task.
    pub skipped: u64,
}

/// Parse a JSON snapshot document.
pub fn parse_snapshot(json: &str) -> Result<Snapshot> {
    serde_json::from_str(json).map_err(|e| Error::Import(format!("invalid snapshot: {e}")))
}

/// Upsert every row of `snapshot` in a single transaction.
pub async fn import_snapshot(db: &Database, snapshot: Snapshot) -> Result<ImportReport> {
    let report = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for profile in &snapshot.profiles {
                repository::upsert_profile(&tx, profile)?;
            }
            for task in &snapshot.tasks {
                repository::upsert_task(&tx, task)?;
            }
            for issue in &snapshot.issues {
                repository::upsert_issue(&tx, issue)?;
            }
            tx.commit()?;
            Ok::<ImportReport, rusqlite::Error>(ImportReport {
                profiles: snapshot.profiles.len() as u64,
                tasks: snapshot.tasks.len() as u64,
                issues: snapshot.issues.len() as u64,
                skipped: 0,
            })
        })
        .await?;
    log::info!(
        "imported {} profiles, {} tasks, {} issues",
        report.profiles,
        report.tasks,
        report.issues
    );
    Ok(report)
}

/// Parse task CSV text. Returns the tasks that parsed and the number of
/// data rows that did not.
pub fn parse_tasks_csv(text: &str) -> Result<(Vec<Task>, u64)> {
    if text.trim().is_empty() {
        return Err(Error::Import("CSV input is empty".into()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| Error::Import(format!("unreadable CSV header: {e}")))?
        .clone();
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_ascii_lowercase(), i))
        .collect();
    for required in ["id", "title", "created_at"] {
        if !columns.contains_key(required) {
            return Err(Error::Import(format!("CSV header is missing `{required}`")));
        }
    }

    let mut tasks = Vec::new();
    let mut skipped = 0;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("skipping unreadable CSV row: {e}");
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        match task_from_record(&columns, &record) {
            Ok(task) => tasks.push(task),
            Err(reason) => {
                let line = record.position().map_or(0, |p| p.line());
                log::warn!("skipping CSV row {line}: {reason}");
                skipped += 1;
            }
        }
    }
    Ok((tasks, skipped))
}

/// Parse task CSV text and upsert every valid row.
pub async fn import_tasks_csv(db: &Database, text: &str) -> Result<ImportReport> {
    let (tasks, skipped) = parse_tasks_csv(text)?;
    let count = tasks.len() as u64;
    db.writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for task in &tasks {
                repository::upsert_task(&tx, task)?;
            }
            tx.commit()?;
            Ok::<(), rusqlite::Error>(())
        })
        .await?;
    log::info!("imported {count} tasks from CSV ({skipped} skipped)");
    Ok(ImportReport {
        tasks: count,
        skipped,
        ..Default::default()
    })
}

/// Read every profile, task, and issue back out of the store.
pub async fn export_snapshot(db: &Database) -> Result<Snapshot> {
    let snapshot = db
        .reader()
        .call(|conn| {
            Ok::<Snapshot, rusqlite::Error>(Snapshot {
                profiles: repository::list_profiles(conn)?,
                tasks: repository::list_tasks(conn, None)?,
                issues: repository::list_issues(conn)?,
            })
        })
        .await?;
    Ok(snapshot)
}

/// Render tasks as CSV with a header row.
pub fn tasks_to_csv(tasks: &[Task]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for task in tasks {
        writer.write_record(task_to_csv_row(task))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Import(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Import(e.to_string()))
}

/// One task as fields in [`CSV_HEADER`] order.
pub fn task_to_csv_row(task: &Task) -> [String; 13] {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        task.id.clone(),
        task.title.clone(),
        task.status.as_str().to_string(),
        task.priority.as_str().to_string(),
        opt(&task.due_date),
        opt(&task.end_time),
        opt(&task.completed_at),
        task.late_completion.to_string(),
        task.tags.join(&TAG_SEPARATOR.to_string()),
        opt(&task.assigned_to),
        task.estimated_hours.map_or(String::new(), |h| h.to_string()),
        task.is_recurring.to_string(),
        task.created_at.clone(),
    ]
}

fn task_from_record(
    columns: &HashMap<String, usize>,
    record: &csv::StringRecord,
) -> std::result::Result<Task, String> {
    let get = |name: &str| field(columns, record, name);
    let required = |name: &str| get(name).ok_or_else(|| format!("missing {name}"));

    let mut task = Task::new(required("id")?, required("title")?, required("created_at")?);
    if let Some(status) = get("status") {
        task.status = TaskStatus::from(status);
    }
    if let Some(priority) = get("priority") {
        task.priority = Priority::from(priority);
    }
    task.due_date = get("due_date").map(str::to_string);
    task.end_time = get("end_time").map(str::to_string);
    task.completed_at = get("completed_at").map(str::to_string);
    task.assigned_to = get("assigned_to").map(str::to_string);
    task.late_completion = parse_bool(get("late_completion"))?;
    task.is_recurring = parse_bool(get("is_recurring"))?;
    task.estimated_hours = get("estimated_hours")
        .map(|h| {
            h.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| format!("invalid estimated_hours `{h}`"))
        })
        .transpose()?;
    if let Some(tags) = get("tags") {
        task.tags = tags
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(task)
}

/// Trimmed, non-empty value of column `name` in `record`.
fn field<'r>(
    columns: &HashMap<String, usize>,
    record: &'r csv::StringRecord,
    name: &str,
) -> Option<&'r str> {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_bool(value: Option<&str>) -> std::result::Result<bool, String> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "y") => Ok(true),
        Some("false" | "0" | "no" | "n") => Ok(false),
        Some(other) => Err(format!("invalid boolean `{other}`")),
    }
}
