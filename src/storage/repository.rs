use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{Issue, IssueStatus, Priority, Profile, StatusDomain, Task, TaskStatus};

// ── Profiles ───────────────────────────────────────────────────────

pub fn upsert_profile(conn: &Connection, profile: &Profile) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO profiles (profile_id, full_name, role, job_description, cached_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(profile_id) DO UPDATE SET
            full_name=excluded.full_name, role=excluded.role,
            job_description=excluded.job_description, cached_at=excluded.cached_at",
        params![
            profile.id,
            profile.full_name,
            profile.role,
            profile.job_description
        ],
    )?;
    Ok(())
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT profile_id, full_name, role, job_description
         FROM profiles ORDER BY full_name, profile_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Profile {
            id: row.get(0)?,
            full_name: row.get(1)?,
            role: row.get(2)?,
            job_description: row.get(3)?,
        })
    })?;
    rows.collect()
}

// ── Tasks ──────────────────────────────────────────────────────────

/// Column list matching [`task_from_row`]. Tags are loaded separately.
pub(crate) const TASK_COLUMNS: &str = "t.task_id, t.title, t.description, t.status, t.priority,
    t.due_date, t.end_time, t.completed_at, t.late_completion, t.assigned_to,
    t.created_by, t.estimated_hours, t.is_recurring, t.recurrence_pattern, t.created_at";

pub fn upsert_task(conn: &Connection, task: &Task) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, title, description, status, priority, due_date, end_time,
            completed_at, late_completion, assigned_to, created_by, estimated_hours,
            is_recurring, recurrence_pattern, created_at, cached_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, datetime('now')
        )
        ON CONFLICT(task_id) DO UPDATE SET
            title=excluded.title, description=excluded.description, status=excluded.status,
            priority=excluded.priority, due_date=excluded.due_date, end_time=excluded.end_time,
            completed_at=excluded.completed_at, late_completion=excluded.late_completion,
            assigned_to=excluded.assigned_to, created_by=excluded.created_by,
            estimated_hours=excluded.estimated_hours, is_recurring=excluded.is_recurring,
            recurrence_pattern=excluded.recurrence_pattern, created_at=excluded.created_at,
            cached_at=excluded.cached_at",
        params![
            task.id,
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_date,
            task.end_time,
            task.completed_at,
            task.late_completion as i32,
            task.assigned_to,
            task.created_by,
            task.estimated_hours,
            task.is_recurring as i32,
            task.recurrence_pattern,
            task.created_at,
        ],
    )?;

    // Tags are rewritten wholesale so order follows the latest snapshot.
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task.id])?;
    let mut stmt =
        conn.prepare_cached("INSERT INTO task_tags (task_id, position, tag) VALUES (?1, ?2, ?3)")?;
    for (position, tag) in task.tags.iter().enumerate() {
        stmt.execute(params![task.id, position as i64, tag])?;
    }
    Ok(())
}

pub fn delete_task(conn: &Connection, task_id: &str) -> Result<bool, rusqlite::Error> {
    let n = conn.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;
    Ok(n > 0)
}

pub(crate) fn task_from_row(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::from(status.as_str()),
        priority: Priority::from(priority.as_str()),
        due_date: row.get(5)?,
        end_time: row.get(6)?,
        completed_at: row.get(7)?,
        late_completion: row.get(8)?,
        tags: Vec::new(),
        assigned_to: row.get(9)?,
        created_by: row.get(10)?,
        estimated_hours: row.get(11)?,
        is_recurring: row.get(12)?,
        recurrence_pattern: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Fill in `tags` for each task from `task_tags`, preserving stored order.
pub(crate) fn attach_tags(conn: &Connection, tasks: &mut [Task]) -> Result<(), rusqlite::Error> {
    if tasks.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare("SELECT task_id, tag FROM task_tags ORDER BY task_id, position")?;
    let mut by_task: HashMap<String, Vec<String>> = HashMap::new();
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (task_id, tag) = row?;
        by_task.entry(task_id).or_default().push(tag);
    }
    for task in tasks.iter_mut() {
        if let Some(tags) = by_task.remove(&task.id) {
            task.tags = tags;
        }
    }
    Ok(())
}

/// All tasks, or only those assigned to `assignee`, oldest first.
pub fn list_tasks(conn: &Connection, assignee: Option<&str>) -> Result<Vec<Task>, rusqlite::Error> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t
         WHERE (?1 IS NULL OR t.assigned_to = ?1)
         ORDER BY t.created_at, t.task_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut tasks = stmt
        .query_map(params![assignee], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    attach_tags(conn, &mut tasks)?;
    Ok(tasks)
}

pub fn get_task(conn: &Connection, task_id: &str) -> Result<Option<Task>, rusqlite::Error> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.task_id = ?1");
    let task = conn
        .query_row(&sql, params![task_id], task_from_row)
        .optional()?;
    match task {
        Some(mut task) => {
            let mut stmt =
                conn.prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY position")?;
            task.tags = stmt
                .query_map(params![task_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(Some(task))
        }
        None => Ok(None),
    }
}

// ── Issues ─────────────────────────────────────────────────────────

pub fn upsert_issue(conn: &Connection, issue: &Issue) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO issues (
            issue_id, title, description, status, priority, reported_by,
            suggested_assignee_id, assigned_to, converted_task_id, created_at,
            resolved_at, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))
        ON CONFLICT(issue_id) DO UPDATE SET
            title=excluded.title, description=excluded.description, status=excluded.status,
            priority=excluded.priority, reported_by=excluded.reported_by,
            suggested_assignee_id=excluded.suggested_assignee_id,
            assigned_to=excluded.assigned_to, converted_task_id=excluded.converted_task_id,
            created_at=excluded.created_at, resolved_at=excluded.resolved_at,
            cached_at=excluded.cached_at",
        params![
            issue.id,
            issue.title,
            issue.description,
            issue.status.as_str(),
            issue.priority.as_str(),
            issue.reported_by,
            issue.suggested_assignee_id,
            issue.assigned_to,
            issue.converted_task_id,
            issue.created_at,
            issue.resolved_at,
        ],
    )?;
    Ok(())
}

pub fn list_issues(conn: &Connection) -> Result<Vec<Issue>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT issue_id, title, description, status, priority, reported_by,
                suggested_assignee_id, assigned_to, converted_task_id, created_at, resolved_at
         FROM issues ORDER BY created_at, issue_id",
    )?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(3)?;
        let priority: String = row.get(4)?;
        Ok(Issue {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: IssueStatus::from(status.as_str()),
            priority: Priority::from(priority.as_str()),
            reported_by: row.get(5)?,
            suggested_assignee_id: row.get(6)?,
            assigned_to: row.get(7)?,
            converted_task_id: row.get(8)?,
            created_at: row.get(9)?,
            resolved_at: row.get(10)?,
        })
    })?;
    rows.collect()
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
