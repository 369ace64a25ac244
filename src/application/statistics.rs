//! Price statistics engine
//!
//! Aggregates the review collaborator's price observations per category
//! into an immutable snapshot: mean/min/max, the cheap/normal/expensive
//! distribution, and an equal-width price histogram. Categories with too
//! few observations produce the zeroed sentinel snapshot instead of an
//! error so consumers stay branch-free.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::domain::constants::pricing;
use crate::domain::local_food::LocalFoodCategoryId;
use crate::domain::price::{
    PriceBucket, PriceDistribution, PriceRange, PriceStatisticsSnapshot,
};
use crate::domain::repositories::PriceObservationSource;

pub struct PriceStatisticsEngine {
    observations: Arc<dyn PriceObservationSource>,
}

impl PriceStatisticsEngine {
    pub fn new(observations: Arc<dyn PriceObservationSource>) -> Self {
        Self { observations }
    }

    /// Builds a fresh snapshot for the category from all current
    /// observations.
    pub async fn compute_statistics(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<PriceStatisticsSnapshot> {
        let observations = self.observations.observations_for(category).await?;
        if observations.len() < pricing::MIN_OBSERVATIONS {
            tracing::debug!(
                category = category.as_str(),
                count = observations.len(),
                "insufficient observations, returning sentinel snapshot"
            );
            return Ok(PriceStatisticsSnapshot::insufficient(category));
        }

        let prices: Vec<i64> = observations.iter().map(|o| o.price_minor_units).collect();
        let total_count = prices.len();
        let sum: i64 = prices.iter().sum();
        let average_price = sum as f64 / total_count as f64;
        let min_price = *prices.iter().min().unwrap_or(&0);
        let max_price = *prices.iter().max().unwrap_or(&0);

        Ok(PriceStatisticsSnapshot {
            category,
            total_count,
            average_price,
            min_price,
            max_price,
            distribution: build_distribution(&prices, average_price),
            ranges: build_ranges(&prices, min_price, max_price),
            computed_at: Utc::now(),
            has_sufficient_data: true,
        })
    }
}

fn build_distribution(prices: &[i64], average: f64) -> PriceDistribution {
    let mut distribution = PriceDistribution::default();
    for &price in prices {
        match PriceBucket::classify(price, average) {
            PriceBucket::Cheap => distribution.cheap_count += 1,
            PriceBucket::Normal => distribution.normal_count += 1,
            PriceBucket::Expensive => distribution.expensive_count += 1,
        }
    }
    let total = prices.len() as f64;
    distribution.cheap_ratio = distribution.cheap_count as f64 / total;
    distribution.normal_ratio = distribution.normal_count as f64 / total;
    distribution.expensive_ratio = distribution.expensive_count as f64 / total;
    distribution
}

/// Equal-width histogram over [min, max]. A degenerate span (all prices
/// equal) collapses to a single range.
fn build_ranges(prices: &[i64], min_price: i64, max_price: i64) -> Vec<PriceRange> {
    let span = max_price - min_price;
    if span == 0 {
        return vec![PriceRange {
            min_price,
            max_price,
            count: prices.len(),
            label: format_krw(min_price),
        }];
    }

    let bucket_count = pricing::HISTOGRAM_RANGES as i64;
    let width = (span + bucket_count - 1) / bucket_count;
    let mut ranges: Vec<PriceRange> = (0..bucket_count)
        .map(|i| {
            let low = min_price + i * width;
            let high = (low + width - 1).min(max_price);
            PriceRange {
                min_price: low,
                max_price: high,
                count: 0,
                label: format!("{} ~ {}", format_krw(low), format_krw(high)),
            }
        })
        .collect();

    for &price in prices {
        let index = (((price - min_price) / width) as usize).min(ranges.len() - 1);
        ranges[index].count += 1;
    }
    ranges
}

/// "12000" -> "12,000원"
pub fn format_krw(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{grouped}원")
    } else {
        format!("{grouped}원")
    }
}
