pub mod analytics;
pub mod cache;
pub mod date_util;
pub mod error;
pub mod import;
pub mod model;
pub mod query;
pub mod settings;
pub mod storage;

pub use analytics::{
    DashboardAnalytics, DashboardInput, DashboardOptions, EmployeeScore, ProblematicTag, TagStats,
    TrendPoint,
};
pub use cache::AnalyticsCache;
pub use error::{Error, Result};
pub use import::{ImportReport, Snapshot};
pub use model::{Issue, IssueStatus, Priority, Profile, Task, TaskStatus};
pub use query::builder::TaskQuery;
pub use query::window::TrendWindow;
pub use settings::Settings;
pub use storage::schema::TableCounts;
pub use storage::Database;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use storage::{repository, schema};

/// Store health and effective settings, for `taskpulse status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub counts: TableCounts,
    pub settings: Settings,
    pub cached_dashboards: u64,
}

/// Main entry point: a task store with a dashboard cache in front of it.
pub struct TaskPulse {
    db: Database,
    cache: AnalyticsCache,
    settings: Settings,
}

impl TaskPulse {
    /// Load settings from `db` and size the cache from them.
    pub async fn open(db: Database) -> Result<Self> {
        let settings = Settings::load(&db).await?;
        let cache = AnalyticsCache::new(settings.cache_capacity, settings.cache_ttl());
        Ok(Self {
            db,
            cache,
            settings,
        })
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Options for the configured default window, optionally scoped.
    pub fn default_options(&self, assignee: Option<&str>) -> DashboardOptions {
        DashboardOptions {
            assignee: assignee.map(str::to_string),
            trend_days: self.settings.trend_days,
        }
    }

    /// Options for an explicit trend window ending today.
    pub fn window_options(&self, assignee: Option<&str>, window: TrendWindow) -> DashboardOptions {
        let today = local_now().date();
        DashboardOptions {
            assignee: assignee.map(str::to_string),
            trend_days: window.days(today),
        }
    }

    // ── Analytics ──────────────────────────────────────────────────

    /// The dashboard for `options`, served from cache when fresh.
    pub async fn dashboard(&self, options: &DashboardOptions) -> Result<Arc<DashboardAnalytics>> {
        let key = options.cache_key();
        self.cache
            .get_or_compute(&key, analytics::load_dashboard(&self.db, options, local_now()))
            .await
    }

    pub async fn employees(&self) -> Result<Vec<EmployeeScore>> {
        let dashboard = self.dashboard(&self.default_options(None)).await?;
        Ok(dashboard.employees.clone())
    }

    pub async fn tags(&self, assignee: Option<&str>) -> Result<Vec<TagStats>> {
        let dashboard = self.dashboard(&self.default_options(assignee)).await?;
        Ok(dashboard.tags.clone())
    }

    pub async fn trend(&self, assignee: Option<&str>, window: TrendWindow) -> Result<Vec<TrendPoint>> {
        let dashboard = self.dashboard(&self.window_options(assignee, window)).await?;
        Ok(dashboard.trend.clone())
    }

    // ── Import ─────────────────────────────────────────────────────

    pub async fn import_snapshot_json(&self, json: &str) -> Result<ImportReport> {
        let snapshot = import::parse_snapshot(json)?;
        import::import_snapshot(&self.db, snapshot).await
    }

    pub async fn import_tasks_csv(&self, text: &str) -> Result<ImportReport> {
        import::import_tasks_csv(&self.db, text).await
    }

    pub async fn export_snapshot(&self) -> Result<Snapshot> {
        import::export_snapshot(&self.db).await
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Validate and persist a setting. Takes effect on the next open.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        settings::validate(key, value)?;
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.trim().to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let counts = self
            .db
            .reader()
            .call(|conn| schema::table_counts(conn))
            .await?;
        Ok(StatusReport {
            counts,
            settings: self.settings.clone(),
            cached_dashboards: self.cache.entry_count().await,
        })
    }
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
