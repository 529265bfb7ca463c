use rusqlite_migration::{Migrations, M};

/// Tables created by the migrations, in creation order.
pub const TABLES: &[&str] = &["profiles", "tasks", "task_tags", "issues", "app_config"];

/// Schema migrations, oldest first.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial.sql"))])
}

/// Row counts for the status report.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableCounts {
    pub profiles: u64,
    pub tasks: u64,
    pub tagged_tasks: u64,
    pub issues: u64,
}

pub fn table_counts(conn: &rusqlite::Connection) -> Result<TableCounts, rusqlite::Error> {
    let count = |sql: &str| -> Result<u64, rusqlite::Error> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
    };
    Ok(TableCounts {
        profiles: count("SELECT COUNT(*) FROM profiles")?,
        tasks: count("SELECT COUNT(*) FROM tasks")?,
        tagged_tasks: count("SELECT COUNT(DISTINCT task_id) FROM task_tags")?,
        issues: count("SELECT COUNT(*) FROM issues")?,
    })
}
