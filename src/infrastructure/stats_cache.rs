//! Statistics cache: latest snapshot per category with TTL
//!
//! Immutable snapshots behind an atomic publish: a snapshot is fully
//! computed before it replaces the previous one, so readers never observe
//! a partially built result. A true miss (or expiry) falls back to
//! synchronous recomputation instead of surfacing missing data for a TTL
//! window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::RwLock;

use crate::application::statistics::PriceStatisticsEngine;
use crate::domain::local_food::{LocalFoodCategoryId, CATALOG};
use crate::domain::price::PriceStatisticsSnapshot;

struct CacheEntry {
    snapshot: Arc<PriceStatisticsSnapshot>,
    stored_at: Instant,
}

pub struct StatisticsCache {
    engine: PriceStatisticsEngine,
    ttl: Duration,
    entries: RwLock<HashMap<LocalFoodCategoryId, CacheEntry>>,
}

impl StatisticsCache {
    pub fn new(engine: PriceStatisticsEngine, ttl: Duration) -> Self {
        Self {
            engine,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached snapshot for the category, recomputing
    /// synchronously on a miss or an expired entry.
    pub async fn get(&self, category: LocalFoodCategoryId) -> Result<Arc<PriceStatisticsSnapshot>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&category) {
                if entry.stored_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.snapshot));
                }
            }
        }

        // Compute outside the lock; a concurrent miss may compute twice,
        // which is harmless since publication replaces wholesale.
        let snapshot = Arc::new(self.engine.compute_statistics(category).await?);
        let mut entries = self.entries.write().await;
        entries.insert(
            category,
            CacheEntry { snapshot: Arc::clone(&snapshot), stored_at: Instant::now() },
        );
        Ok(snapshot)
    }

    /// Recomputes every category, then swaps the whole map in one step.
    /// Readers polling during the rebuild observe either the fully-old or
    /// fully-new state.
    pub async fn rebuild_all(&self) -> Result<()> {
        let mut fresh = HashMap::with_capacity(CATALOG.len());
        for category in CATALOG {
            let snapshot = Arc::new(self.engine.compute_statistics(category.id).await?);
            fresh.insert(
                category.id,
                CacheEntry { snapshot, stored_at: Instant::now() },
            );
        }
        *self.entries.write().await = fresh;
        tracing::info!(categories = CATALOG.len(), "statistics cache rebuilt");
        Ok(())
    }

    /// Drops every entry. Safe to call immediately before a rebuild: the
    /// next reader falls back to synchronous recomputation rather than
    /// observing missing data.
    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    pub async fn invalidate(&self, category: LocalFoodCategoryId) {
        self.entries.write().await.remove(&category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceObservation;
    use crate::test_support::InMemoryObservations;
    use chrono::Utc;

    fn observations_with(count: usize, price: i64) -> Arc<InMemoryObservations> {
        let source = Arc::new(InMemoryObservations::new());
        for i in 0..count {
            source.push(PriceObservation {
                category: LocalFoodCategoryId::GogiGuksu,
                restaurant_id: i as i64 + 1,
                price_minor_units: price,
                observed_at: Utc::now(),
            });
        }
        source
    }

    fn cache(source: Arc<InMemoryObservations>, ttl: Duration) -> StatisticsCache {
        StatisticsCache::new(PriceStatisticsEngine::new(source), ttl)
    }

    #[tokio::test]
    async fn fresh_hit_returns_same_snapshot() {
        let cache = cache(observations_with(6, 9_000), Duration::from_secs(60));
        let first = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        let second = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn expired_entry_recomputes() {
        let source = observations_with(6, 9_000);
        let cache = cache(source.clone(), Duration::ZERO);
        let first = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();

        source.push(PriceObservation {
            category: LocalFoodCategoryId::GogiGuksu,
            restaurant_id: 99,
            price_minor_units: 20_000,
            observed_at: Utc::now(),
        });
        let second = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.total_count, 7);
    }

    #[tokio::test]
    async fn miss_on_sparse_category_yields_sentinel_not_error() {
        let cache = cache(observations_with(0, 0), Duration::from_secs(60));
        let snapshot = cache.get(LocalFoodCategoryId::Momguk).await.unwrap();
        assert!(!snapshot.has_sufficient_data);
    }

    #[tokio::test]
    async fn rebuild_replaces_every_category_at_once() {
        let source = observations_with(6, 9_000);
        let cache = cache(source.clone(), Duration::from_secs(600));
        let before = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();

        source.push(PriceObservation {
            category: LocalFoodCategoryId::GogiGuksu,
            restaurant_id: 50,
            price_minor_units: 30_000,
            observed_at: Utc::now(),
        });
        cache.rebuild_all().await.unwrap();

        let after = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.total_count, 7);
        // every catalog category has an entry after a full rebuild
        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), CATALOG.len());
    }

    #[tokio::test]
    async fn invalidate_then_read_recomputes_synchronously() {
        let cache = cache(observations_with(6, 9_000), Duration::from_secs(600));
        cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        cache.invalidate_all().await;
        let snapshot = cache.get(LocalFoodCategoryId::GogiGuksu).await.unwrap();
        assert!(snapshot.has_sufficient_data);
    }
}
