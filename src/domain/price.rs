//! Price observation and statistics snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::constants::pricing;
use crate::domain::local_food::LocalFoodCategoryId;

/// A single observed price for a restaurant in a category, derived from
/// review/menu data owned by the review collaborator. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub category: LocalFoodCategoryId,
    pub restaurant_id: i64,
    /// KRW; prices have no fractional unit in practice.
    pub price_minor_units: i64,
    pub observed_at: DateTime<Utc>,
}

/// Cheap/normal/expensive classification relative to the category average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceBucket {
    Cheap,
    Normal,
    Expensive,
}

impl PriceBucket {
    /// Classifies a price against the category average using the fixed
    /// ratio thresholds.
    pub fn classify(price: i64, average: f64) -> Self {
        let price = price as f64;
        if price < average * pricing::CHEAP_THRESHOLD_RATIO {
            PriceBucket::Cheap
        } else if price > average * pricing::EXPENSIVE_THRESHOLD_RATIO {
            PriceBucket::Expensive
        } else {
            PriceBucket::Normal
        }
    }
}

/// Counts and ratios of the three distribution buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PriceDistribution {
    pub cheap_count: usize,
    pub normal_count: usize,
    pub expensive_count: usize,
    pub cheap_ratio: f64,
    pub normal_ratio: f64,
    pub expensive_ratio: f64,
}

/// One histogram range with a human-readable label such as
/// "8,000원 ~ 10,000원".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_price: i64,
    pub max_price: i64,
    pub count: usize,
    pub label: String,
}

/// Immutable, fully computed statistics for one category.
///
/// Built by the statistics engine, published atomically to the cache,
/// discarded wholesale at the next rebuild. Never mutated after build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStatisticsSnapshot {
    pub category: LocalFoodCategoryId,
    pub total_count: usize,
    pub average_price: f64,
    pub min_price: i64,
    pub max_price: i64,
    pub distribution: PriceDistribution,
    pub ranges: Vec<PriceRange>,
    pub computed_at: DateTime<Utc>,
    /// False when fewer than the minimum observations existed; aggregates
    /// are zeroed, never null, so consumers stay branch-free.
    pub has_sufficient_data: bool,
}

impl PriceStatisticsSnapshot {
    /// Sentinel snapshot for categories without enough observations.
    pub fn insufficient(category: LocalFoodCategoryId) -> Self {
        Self {
            category,
            total_count: 0,
            average_price: 0.0,
            min_price: 0,
            max_price: 0,
            distribution: PriceDistribution::default(),
            ranges: Vec::new(),
            computed_at: Utc::now(),
            has_sufficient_data: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_ratio_thresholds() {
        // average 10,000: cheap below 8,000, expensive above 12,000
        assert_eq!(PriceBucket::classify(7_999, 10_000.0), PriceBucket::Cheap);
        assert_eq!(PriceBucket::classify(8_000, 10_000.0), PriceBucket::Normal);
        assert_eq!(PriceBucket::classify(12_000, 10_000.0), PriceBucket::Normal);
        assert_eq!(PriceBucket::classify(12_001, 10_000.0), PriceBucket::Expensive);
    }

    #[test]
    fn sentinel_snapshot_is_zeroed_not_null() {
        let snapshot = PriceStatisticsSnapshot::insufficient(LocalFoodCategoryId::Momguk);
        assert!(!snapshot.has_sufficient_data);
        assert_eq!(snapshot.total_count, 0);
        assert_eq!(snapshot.average_price, 0.0);
        assert!(snapshot.ranges.is_empty());
    }
}
