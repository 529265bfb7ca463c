//! Short-lived cache for computed dashboards.
//!
//! Entries expire after a fixed time-to-live and are never invalidated on
//! write, so a cached dashboard can lag the store by at most the TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::DashboardAnalytics;
use crate::error::{Error, Result};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: u64 = 256;

/// In-process cache of dashboards keyed by scope and trend window.
#[derive(Clone)]
pub struct AnalyticsCache {
    cache: moka::future::Cache<String, Arc<DashboardAnalytics>>,
    ttl: Duration,
}

impl std::fmt::Debug for AnalyticsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsCache")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Default for AnalyticsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl AnalyticsCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        log::debug!(
            "analytics cache created (capacity {max_capacity}, ttl {}s)",
            ttl.as_secs()
        );
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<Arc<DashboardAnalytics>> {
        let hit = self.cache.get(key).await;
        if hit.is_some() {
            log::debug!("cache HIT {key}");
        } else {
            log::debug!("cache MISS {key}");
        }
        hit
    }

    /// Return the cached dashboard for `key`, or run `compute` and cache its
    /// result. Concurrent misses on one key share a single computation.
    /// Failures are returned to every waiter and never cached.
    pub async fn get_or_compute<F>(&self, key: &str, compute: F) -> Result<Arc<DashboardAnalytics>>
    where
        F: Future<Output = Result<DashboardAnalytics>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }
        self.cache
            .try_get_with(key.to_string(), async move {
                log::debug!("computing dashboard for {key}");
                compute.await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<Error>| Error::Other(e.to_string()))
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Live entries, after pending inserts and expirations are applied.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
