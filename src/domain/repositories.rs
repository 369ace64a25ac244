//! Collaborator interfaces for the ingestion and statistics pipeline
//!
//! The pipeline does not own persistence: it consumes a restaurant
//! lookup/upsert contract and a review/price-observation source, and pushes
//! run notifications to an alerting collaborator. These traits are those
//! contracts; concrete implementations live in the infrastructure layer.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::batch::BatchResult;
use crate::domain::local_food::LocalFoodCategoryId;
use crate::domain::price::PriceObservation;
use crate::domain::restaurant::{CanonicalRestaurant, Source};

/// Lookup/upsert contract over the canonical restaurant catalog.
#[async_trait]
pub trait RestaurantCatalog: Send + Sync {
    /// Deterministic lookup by a source's own identifier.
    async fn find_by_external_id(
        &self,
        source: Source,
        external_id: &str,
    ) -> Result<Option<CanonicalRestaurant>>;

    /// All canonical records within `radius_meters` of the coordinate.
    async fn find_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<CanonicalRestaurant>>;

    /// Persists a new canonical record, returning its assigned id.
    async fn insert(&self, restaurant: &CanonicalRestaurant) -> Result<i64>;

    /// Replaces the stored record with the given (already merged) state.
    /// Must be atomic per record id, and must floor the monotonic fields
    /// (good-price flag, local-store flag, local-food tag) at their stored
    /// values: a merge computed from a stale read may not clear them.
    async fn update(&self, restaurant: &CanonicalRestaurant) -> Result<()>;

    /// Active restaurants tagged with the given regional-food category.
    async fn find_by_local_food(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<CanonicalRestaurant>>;

    async fn count(&self) -> Result<u64>;
}

/// Per-restaurant review aggregates used for search result rows and sorting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub average_rating: f64,
    pub review_count: u32,
    /// Share of reviews marked satisfied, in [0, 1].
    pub satisfaction: f64,
    pub image_url: Option<String>,
}

/// Read-only contract over the review collaborator's price data.
#[async_trait]
pub trait PriceObservationSource: Send + Sync {
    /// Every price observation recorded for the category.
    async fn observations_for(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<PriceObservation>>;

    /// Representative (mean observed) price per restaurant in the category.
    async fn representative_prices(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<HashMap<i64, i64>>;

    /// Review aggregates for the given restaurants. Restaurants without
    /// reviews simply have no entry.
    async fn review_summaries(
        &self,
        restaurant_ids: &[i64],
    ) -> Result<HashMap<i64, ReviewSummary>>;
}

/// Run-outcome notifications to the external alerting collaborator.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify_success(&self, result: &BatchResult);
    async fn notify_failure(&self, result: &BatchResult);
}

/// Default notifier: structured log lines only. The production alerting
/// channel is an external collaborator wired in at startup.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify_success(&self, result: &BatchResult) {
        tracing::info!(
            source = %result.source,
            run_id = %result.run_id,
            success = result.stats.success,
            skip = result.stats.skip,
            error = result.stats.error,
            "ingestion run succeeded"
        );
    }

    async fn notify_failure(&self, result: &BatchResult) {
        tracing::error!(
            source = %result.source,
            run_id = %result.run_id,
            error_message = result.error_message.as_deref().unwrap_or("unknown"),
            "ingestion run failed"
        );
    }
}
