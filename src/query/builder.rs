use chrono::NaiveDateTime;

use crate::analytics::is_overdue;
use crate::error::Result;
use crate::import::tasks_to_csv;
use crate::model::{Priority, StatusDomain, Task, TaskStatus};
use crate::storage::repository::{attach_tags, task_from_row, TASK_COLUMNS};
use crate::storage::Database;

/// Builder for constructing task queries with optional filters.
///
/// Every filter except `overdue` is pushed into SQL. The overdue filter goes
/// through [`is_overdue`] after the fetch so it agrees with the analytics.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    assignee: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    tag: Option<String>,
    created_after: Option<String>,
    created_before: Option<String>,
    due_after: Option<String>,
    due_before: Option<String>,
    overdue: Option<bool>,
    as_of: Option<NaiveDateTime>,
    limit: Option<u32>,
    order_desc: bool,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignee(mut self, id: &str) -> Self {
        self.assignee = Some(id.to_string());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn tag(mut self, name: &str) -> Self {
        self.tag = Some(name.to_string());
        self
    }

    pub fn created_after(mut self, date: &str) -> Self {
        self.created_after = Some(date.to_string());
        self
    }

    pub fn created_before(mut self, date: &str) -> Self {
        self.created_before = Some(date.to_string());
        self
    }

    pub fn due_after(mut self, date: &str) -> Self {
        self.due_after = Some(date.to_string());
        self
    }

    pub fn due_before(mut self, date: &str) -> Self {
        self.due_before = Some(date.to_string());
        self
    }

    pub fn overdue(mut self, val: bool) -> Self {
        self.overdue = Some(val);
        self
    }

    /// Reference instant for the overdue filter (default: local now).
    pub fn as_of(mut self, now: NaiveDateTime) -> Self {
        self.as_of = Some(now);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn descending(mut self) -> Self {
        self.order_desc = true;
        self
    }

    /// Build and execute the query, returning tasks with their tags.
    pub async fn tasks(self, db: &Database) -> Result<Vec<Task>> {
        self.fetch(db, true).await
    }

    /// Build and execute the query, returning a count of matching tasks.
    /// The limit does not apply.
    pub async fn count(self, db: &Database) -> Result<u64> {
        if self.overdue.is_some() {
            return Ok(self.fetch(db, false).await?.len() as u64);
        }
        let builder = self;
        db.reader()
            .call(move |conn| {
                let (inner_sql, params) = builder.build_sql(false);
                let sql = format!("SELECT COUNT(*) FROM ({inner_sql})");
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
                Ok::<u64, rusqlite::Error>(count as u64)
            })
            .await
            .map_err(|e| crate::error::Error::Database(e.to_string()))
    }

    async fn fetch(self, db: &Database, apply_limit: bool) -> Result<Vec<Task>> {
        let builder = self;
        let now = builder
            .as_of
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        db.reader()
            .call(move |conn| {
                let (sql, params) = builder.build_sql(apply_limit);
                let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                let mut stmt = conn.prepare(&sql)?;
                let mut tasks = stmt
                    .query_map(param_refs.as_slice(), task_from_row)?
                    .collect::<std::result::Result<Vec<Task>, _>>()?;

                if let Some(want) = builder.overdue {
                    tasks.retain(|t| is_overdue(t, now) == want);
                    if let (Some(limit), true) = (builder.limit, apply_limit) {
                        tasks.truncate(limit as usize);
                    }
                }
                attach_tags(conn, &mut tasks)?;
                Ok::<Vec<Task>, rusqlite::Error>(tasks)
            })
            .await
            .map_err(|e| crate::error::Error::Database(e.to_string()))
    }

    /// Build and execute the query, returning results as JSON.
    pub async fn to_json(self, db: &Database) -> Result<String> {
        let rows = self.tasks(db).await?;
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Build and execute the query, returning results as CSV.
    pub async fn to_csv(self, db: &Database) -> Result<String> {
        let rows = self.tasks(db).await?;
        tasks_to_csv(&rows)
    }

    fn build_sql(&self, apply_limit: bool) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut wheres = Vec::new();
        let mut param_idx = 1;

        if let Some(ref id) = self.assignee {
            wheres.push(format!("t.assigned_to = ?{param_idx}"));
            params.push(Box::new(id.clone()));
            param_idx += 1;
        }

        if let Some(status) = self.status {
            wheres.push(format!("t.status = ?{param_idx}"));
            params.push(Box::new(status.as_str()));
            param_idx += 1;
        }

        if let Some(priority) = self.priority {
            wheres.push(format!("t.priority = ?{param_idx}"));
            params.push(Box::new(priority.as_str()));
            param_idx += 1;
        }

        if let Some(ref tag) = self.tag {
            wheres.push(format!(
                "EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = t.task_id AND tt.tag = ?{param_idx})"
            ));
            params.push(Box::new(tag.clone()));
            param_idx += 1;
        }

        // Date filters compare the YYYY-MM-DD prefix so timestamps and bare
        // dates mix.
        let date_filters = [
            ("t.created_at", ">=", &self.created_after),
            ("t.created_at", "<=", &self.created_before),
            ("t.due_date", ">=", &self.due_after),
            ("t.due_date", "<=", &self.due_before),
        ];
        for (column, op, value) in date_filters {
            if let Some(date) = value {
                wheres.push(format!("substr({column}, 1, 10) {op} ?{param_idx}"));
                params.push(Box::new(date.clone()));
                param_idx += 1;
            }
        }

        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks t");
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }

        let order_dir = if self.order_desc { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY t.created_at {order_dir}, t.task_id {order_dir}"));

        // The overdue filter runs after the fetch, so the limit has to as well.
        if let (Some(limit), None, true) = (self.limit, self.overdue, apply_limit) {
            sql.push_str(&format!(" LIMIT ?{param_idx}"));
            params.push(Box::new(limit));
        }

        (sql, params)
    }
}
