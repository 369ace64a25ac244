//! Price-range restaurant search
//!
//! Given a category and a price the user clicked in a statistics histogram,
//! returns the restaurants whose representative price falls inside a fixed
//! margin around it, filtered by distance from the caller's position and
//! sorted by the requested order. "No data" is an empty page, never an
//! error.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::constants::pricing;
use crate::domain::geo::haversine_meters;
use crate::domain::local_food::{self, LocalFoodCategoryId};
use crate::domain::repositories::{PriceObservationSource, RestaurantCatalog};

/// Caller-specified result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Distance,
    Popularity,
    Rating,
    Satisfaction,
}

/// One search result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub distance_meters: f64,
    pub representative_price: i64,
    pub category_tags: Vec<String>,
    pub average_rating: f64,
    pub review_count: u32,
    pub is_good_price_store: bool,
    pub is_local_store: bool,
    pub image: Option<String>,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<RestaurantSummary>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u32,
}

impl SearchPage {
    fn empty(page: u32, page_size: u32) -> Self {
        Self { items: Vec::new(), page, page_size, total_count: 0 }
    }
}

pub struct PriceRangeSearch {
    catalog: Arc<dyn RestaurantCatalog>,
    observations: Arc<dyn PriceObservationSource>,
}

impl PriceRangeSearch {
    pub fn new(
        catalog: Arc<dyn RestaurantCatalog>,
        observations: Arc<dyn PriceObservationSource>,
    ) -> Self {
        Self { catalog, observations }
    }

    /// Restaurants in `category` whose representative price lies within the
    /// fixed margin of `clicked_price`, within `radius_meters` of the
    /// caller's position.
    #[allow(clippy::too_many_arguments)]
    pub async fn search_by_price_range(
        &self,
        category: LocalFoodCategoryId,
        clicked_price: i64,
        latitude: f64,
        longitude: f64,
        radius_meters: Option<f64>,
        sort: SortOrder,
        page: u32,
        page_size: u32,
    ) -> Result<SearchPage> {
        let page = page.max(1);
        if page_size == 0 {
            return Ok(SearchPage::empty(page, page_size));
        }

        let radius = radius_meters.unwrap_or(pricing::DEFAULT_SEARCH_RADIUS_METERS);
        let window_low = clicked_price - pricing::PRICE_SEARCH_MARGIN;
        let window_high = clicked_price + pricing::PRICE_SEARCH_MARGIN;

        let restaurants = self.catalog.find_by_local_food(category).await?;
        let prices = self.observations.representative_prices(category).await?;

        let mut matched: Vec<RestaurantSummary> = Vec::new();
        for restaurant in restaurants {
            let Some(&price) = prices.get(&restaurant.id) else {
                continue;
            };
            if !(window_low..=window_high).contains(&price) {
                continue;
            }
            let distance =
                haversine_meters(latitude, longitude, restaurant.latitude, restaurant.longitude);
            if distance > radius {
                continue;
            }

            let mut category_tags = vec![restaurant.category.clone()];
            if let Some(tag) = restaurant.local_food_category.and_then(local_food::category) {
                category_tags.push(tag.display_name.to_string());
            }

            matched.push(RestaurantSummary {
                id: restaurant.id,
                name: restaurant.name,
                address: restaurant.address,
                distance_meters: distance,
                representative_price: price,
                category_tags,
                average_rating: 0.0,
                review_count: 0,
                is_good_price_store: restaurant.is_good_price_store,
                is_local_store: restaurant.is_local_store,
                image: None,
            });
        }

        if matched.is_empty() {
            return Ok(SearchPage::empty(page, page_size));
        }

        let ids: Vec<i64> = matched.iter().map(|m| m.id).collect();
        let summaries = self.observations.review_summaries(&ids).await?;
        for row in &mut matched {
            if let Some(summary) = summaries.get(&row.id) {
                row.average_rating = summary.average_rating;
                row.review_count = summary.review_count;
                row.image = summary.image_url.clone();
            }
        }

        sort_rows(&mut matched, sort, &summaries);

        let total_count = matched.len() as u32;
        let start = u64::from(page - 1) * u64::from(page_size);
        let items = matched
            .into_iter()
            .skip(start as usize)
            .take(page_size as usize)
            .collect();

        Ok(SearchPage { items, page, page_size, total_count })
    }
}

fn sort_rows(
    rows: &mut [RestaurantSummary],
    sort: SortOrder,
    summaries: &std::collections::HashMap<i64, crate::domain::repositories::ReviewSummary>,
) {
    match sort {
        SortOrder::Distance => {
            rows.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        }
        SortOrder::Popularity => {
            rows.sort_by(|a, b| b.review_count.cmp(&a.review_count));
        }
        SortOrder::Rating => {
            rows.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        }
        SortOrder::Satisfaction => {
            let satisfaction = |row: &RestaurantSummary| {
                summaries.get(&row.id).map_or(0.0, |s| s.satisfaction)
            };
            rows.sort_by(|a, b| satisfaction(b).total_cmp(&satisfaction(a)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceObservation;
    use crate::domain::repositories::ReviewSummary;
    use crate::domain::restaurant::{CanonicalRestaurant, NormalizedRecord, Source};
    use crate::test_support::{InMemoryCatalog, InMemoryObservations};
    use chrono::Utc;

    const ORIGIN_LAT: f64 = 33.4890;
    const ORIGIN_LON: f64 = 126.4983;

    async fn seed_restaurant(
        catalog: &InMemoryCatalog,
        name: &str,
        lat: f64,
        lon: f64,
    ) -> i64 {
        let record = NormalizedRecord {
            source: Source::MapSearch,
            external_id: name.to_string(),
            name: name.to_string(),
            category: "한식".to_string(),
            address: "제주시 어딘가 1".to_string(),
            latitude: lat,
            longitude: lon,
            phone: None,
            menu_text: None,
        };
        let canonical = CanonicalRestaurant::from_normalized(
            &record,
            Some(LocalFoodCategoryId::GogiGuksu),
        );
        catalog.insert(&canonical).await.unwrap()
    }

    fn observe(source: &InMemoryObservations, restaurant_id: i64, price: i64) {
        source.push(PriceObservation {
            category: LocalFoodCategoryId::GogiGuksu,
            restaurant_id,
            price_minor_units: price,
            observed_at: Utc::now(),
        });
    }

    async fn setup() -> (PriceRangeSearch, Arc<InMemoryCatalog>, Arc<InMemoryObservations>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let observations = Arc::new(InMemoryObservations::new());
        let search = PriceRangeSearch::new(catalog.clone(), observations.clone());
        (search, catalog, observations)
    }

    #[tokio::test]
    async fn window_filters_representative_prices() {
        let (search, catalog, observations) = setup().await;
        let near = seed_restaurant(&catalog, "창가국수", ORIGIN_LAT, ORIGIN_LON).await;
        let cheap = seed_restaurant(&catalog, "싼집", ORIGIN_LAT + 0.001, ORIGIN_LON).await;
        let pricey = seed_restaurant(&catalog, "비싼집", ORIGIN_LAT, ORIGIN_LON + 0.001).await;
        observe(&observations, near, 10_000);
        observe(&observations, cheap, 7_000); // below 7,500 window floor
        observe(&observations, pricey, 13_000); // above 12,500 ceiling

        let page = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(5_000.0),
                SortOrder::Distance,
                1,
                20,
            )
            .await
            .unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, near);
        assert!((7_500..=12_500).contains(&page.items[0].representative_price));
    }

    #[tokio::test]
    async fn radius_excludes_distant_restaurants() {
        let (search, catalog, observations) = setup().await;
        let near = seed_restaurant(&catalog, "가까운집", ORIGIN_LAT, ORIGIN_LON).await;
        // Seogwipo, ~28 km away
        let far = seed_restaurant(&catalog, "먼집", 33.2541, 126.5601).await;
        observe(&observations, near, 10_000);
        observe(&observations, far, 10_000);

        let page = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(1_000.0),
                SortOrder::Distance,
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, near);
    }

    #[tokio::test]
    async fn rating_sort_uses_review_summaries() {
        let (search, catalog, observations) = setup().await;
        let a = seed_restaurant(&catalog, "에이", ORIGIN_LAT, ORIGIN_LON).await;
        let b = seed_restaurant(&catalog, "비이", ORIGIN_LAT + 0.0005, ORIGIN_LON).await;
        observe(&observations, a, 10_000);
        observe(&observations, b, 10_000);
        observations.set_summary(a, ReviewSummary { average_rating: 3.5, review_count: 10, satisfaction: 0.6, image_url: None });
        observations.set_summary(b, ReviewSummary { average_rating: 4.8, review_count: 4, satisfaction: 0.9, image_url: None });

        let page = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(5_000.0),
                SortOrder::Rating,
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(page.items[0].id, b);
        assert_eq!(page.items[1].id, a);
    }

    #[tokio::test]
    async fn no_matches_is_an_empty_page() {
        let (search, _catalog, _observations) = setup().await;
        let page = search
            .search_by_price_range(
                LocalFoodCategoryId::Momguk,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                None,
                SortOrder::Distance,
                1,
                20,
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn absurd_page_number_yields_empty_page_not_panic() {
        let (search, catalog, observations) = setup().await;
        let id = seed_restaurant(&catalog, "국수집", ORIGIN_LAT, ORIGIN_LON).await;
        observe(&observations, id, 10_000);

        let page = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(5_000.0),
                SortOrder::Distance,
                u32::MAX,
                u32::MAX,
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn pagination_slices_sorted_results() {
        let (search, catalog, observations) = setup().await;
        for i in 0..5 {
            let id = seed_restaurant(
                &catalog,
                &format!("국수{i}"),
                ORIGIN_LAT + f64::from(i) * 0.0004,
                ORIGIN_LON,
            )
            .await;
            observe(&observations, id, 10_000);
        }

        let first = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(5_000.0),
                SortOrder::Distance,
                1,
                2,
            )
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_count, 5);

        let last = search
            .search_by_price_range(
                LocalFoodCategoryId::GogiGuksu,
                10_000,
                ORIGIN_LAT,
                ORIGIN_LON,
                Some(5_000.0),
                SortOrder::Distance,
                3,
                2,
            )
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
    }
}
