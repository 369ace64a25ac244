//! In-memory collaborator implementations for tests
//!
//! Keeps unit and integration tests isolated from SQLite: the catalog and
//! the review collaborator are backed by plain maps behind a mutex. The
//! semantics mirror the contracts in `domain::repositories`.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::geo::haversine_meters;
use crate::domain::local_food::LocalFoodCategoryId;
use crate::domain::price::PriceObservation;
use crate::domain::repositories::{PriceObservationSource, RestaurantCatalog, ReviewSummary};
use crate::domain::restaurant::{CanonicalRestaurant, Source};

/// Map-backed canonical catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: Mutex<InMemoryCatalogState>,
}

#[derive(Default)]
struct InMemoryCatalogState {
    next_id: i64,
    restaurants: HashMap<i64, CanonicalRestaurant>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<CanonicalRestaurant> {
        self.inner
            .lock()
            .expect("catalog lock")
            .restaurants
            .get(&id)
            .cloned()
    }

    pub fn all(&self) -> Vec<CanonicalRestaurant> {
        self.inner
            .lock()
            .expect("catalog lock")
            .restaurants
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RestaurantCatalog for InMemoryCatalog {
    async fn find_by_external_id(
        &self,
        source: Source,
        external_id: &str,
    ) -> Result<Option<CanonicalRestaurant>> {
        let state = self.inner.lock().expect("catalog lock");
        Ok(state
            .restaurants
            .values()
            .find(|r| r.external_ids.get(&source).map(String::as_str) == Some(external_id))
            .cloned())
    }

    async fn find_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<CanonicalRestaurant>> {
        let state = self.inner.lock().expect("catalog lock");
        Ok(state
            .restaurants
            .values()
            .filter(|r| {
                haversine_meters(latitude, longitude, r.latitude, r.longitude) <= radius_meters
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, restaurant: &CanonicalRestaurant) -> Result<i64> {
        let mut state = self.inner.lock().expect("catalog lock");
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = restaurant.clone();
        stored.id = id;
        state.restaurants.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, restaurant: &CanonicalRestaurant) -> Result<()> {
        let mut state = self.inner.lock().expect("catalog lock");
        let mut incoming = restaurant.clone();
        if let Some(stored) = state.restaurants.get(&restaurant.id) {
            // Same monotonic floor the persistent catalog applies.
            incoming.is_good_price_store |= stored.is_good_price_store;
            incoming.is_local_store |= stored.is_local_store;
            if incoming.local_food_category.is_none() {
                incoming.local_food_category = stored.local_food_category;
            }
        }
        state.restaurants.insert(restaurant.id, incoming);
        Ok(())
    }

    async fn find_by_local_food(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<CanonicalRestaurant>> {
        let state = self.inner.lock().expect("catalog lock");
        Ok(state
            .restaurants
            .values()
            .filter(|r| r.is_active && r.local_food_category == Some(category))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.lock().expect("catalog lock").restaurants.len() as u64)
    }
}

/// Fixed-content review collaborator.
#[derive(Default)]
pub struct InMemoryObservations {
    observations: Mutex<Vec<PriceObservation>>,
    summaries: Mutex<HashMap<i64, ReviewSummary>>,
}

impl InMemoryObservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, observation: PriceObservation) {
        self.observations
            .lock()
            .expect("observations lock")
            .push(observation);
    }

    pub fn set_summary(&self, restaurant_id: i64, summary: ReviewSummary) {
        self.summaries
            .lock()
            .expect("summaries lock")
            .insert(restaurant_id, summary);
    }
}

#[async_trait]
impl PriceObservationSource for InMemoryObservations {
    async fn observations_for(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<PriceObservation>> {
        Ok(self
            .observations
            .lock()
            .expect("observations lock")
            .iter()
            .filter(|o| o.category == category)
            .cloned()
            .collect())
    }

    async fn representative_prices(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<HashMap<i64, i64>> {
        let mut sums: HashMap<i64, (i64, i64)> = HashMap::new();
        for obs in self
            .observations
            .lock()
            .expect("observations lock")
            .iter()
            .filter(|o| o.category == category)
        {
            let entry = sums.entry(obs.restaurant_id).or_insert((0, 0));
            entry.0 += obs.price_minor_units;
            entry.1 += 1;
        }
        Ok(sums
            .into_iter()
            .map(|(id, (sum, n))| (id, sum / n))
            .collect())
    }

    async fn review_summaries(
        &self,
        restaurant_ids: &[i64],
    ) -> Result<HashMap<i64, ReviewSummary>> {
        let summaries = self.summaries.lock().expect("summaries lock");
        Ok(restaurant_ids
            .iter()
            .filter_map(|id| summaries.get(id).map(|s| (*id, s.clone())))
            .collect())
    }
}
