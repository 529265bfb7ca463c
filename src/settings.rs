use std::time::Duration;

use serde::Serialize;

use crate::analytics::DEFAULT_TREND_DAYS;
use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::error::{Error, Result};
use crate::query::window::MAX_WINDOW_DAYS;
use crate::storage::{repository, Database};

pub const KEY_CACHE_TTL_SECS: &str = "cache_ttl_secs";
pub const KEY_CACHE_CAPACITY: &str = "cache_capacity";
pub const KEY_TREND_DAYS: &str = "trend_days";

/// Keys `config set` accepts.
pub const KNOWN_KEYS: &[&str] = &[KEY_CACHE_TTL_SECS, KEY_CACHE_CAPACITY, KEY_TREND_DAYS];

/// Runtime settings persisted in `app_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub trend_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            cache_capacity: DEFAULT_CAPACITY,
            trend_days: DEFAULT_TREND_DAYS,
        }
    }
}

impl Settings {
    /// Read settings from the store, falling back to defaults for unset keys.
    pub async fn load(db: &Database) -> Result<Self> {
        let pairs = db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?;
        let mut settings = Settings::default();
        for (key, value) in &pairs {
            settings.apply(key, value)?;
        }
        Ok(settings)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate and apply one key. Unknown keys are ignored so the table can
    /// hold values other tools own.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            KEY_CACHE_TTL_SECS => self.cache_ttl_secs = parse_number(key, value, 0, 3600)?,
            KEY_CACHE_CAPACITY => self.cache_capacity = parse_number(key, value, 1, 1_000_000)?,
            KEY_TREND_DAYS => {
                self.trend_days = parse_number(key, value, 1, u64::from(MAX_WINDOW_DAYS))? as u32
            }
            _ => {}
        }
        Ok(())
    }
}

/// Reject a value before it is written, so `load` never sees it.
pub fn validate(key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(Error::Config(format!(
            "unknown setting `{key}` (known: {})",
            KNOWN_KEYS.join(", ")
        )));
    }
    Settings::default().apply(key, value)
}

fn parse_number(key: &str, value: &str, min: u64, max: u64) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| Error::Config(format!("{key} must be a number from {min} to {max}, got `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.cache_ttl(), Duration::from_secs(300));
        assert_eq!(s.trend_days, 30);
    }

    #[test]
    fn test_validate() {
        assert!(validate("trend_days", "14").is_ok());
        assert!(validate("cache_ttl_secs", "0").is_ok());
        assert!(matches!(validate("trend_days", "0"), Err(Error::Config(_))));
        assert!(matches!(validate("trend_days", "abc"), Err(Error::Config(_))));
        assert!(matches!(validate("cache_capacity", "0"), Err(Error::Config(_))));
        assert!(matches!(validate("colour", "blue"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let db = Database::open_memory().await.unwrap();
        assert_eq!(Settings::load(&db).await.unwrap(), Settings::default());

        db.writer()
            .call(|conn| {
                repository::set_config(conn, KEY_TREND_DAYS, "14")?;
                repository::set_config(conn, KEY_CACHE_TTL_SECS, "180")?;
                repository::set_config(conn, "theme", "dark")?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let s = Settings::load(&db).await.unwrap();
        assert_eq!(s.trend_days, 14);
        assert_eq!(s.cache_ttl_secs, 180);
        assert_eq!(s.cache_capacity, DEFAULT_CAPACITY);
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_value() {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| repository::set_config(conn, KEY_CACHE_CAPACITY, "lots"))
            .await
            .unwrap();
        assert!(matches!(Settings::load(&db).await, Err(Error::Config(_))));
    }
}
