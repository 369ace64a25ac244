//! SQLite-backed catalog and review collaborator implementations
//!
//! Geographic lookup uses a bounding-box SQL prefilter on the lat/lon
//! index, then exact haversine filtering in Rust. Updates run in a
//! transaction per record id, which is the per-record write serialization
//! the reconciliation contract requires.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::geo::haversine_meters;
use crate::domain::local_food::LocalFoodCategoryId;
use crate::domain::price::PriceObservation;
use crate::domain::repositories::{PriceObservationSource, RestaurantCatalog, ReviewSummary};
use crate::domain::restaurant::{CanonicalRestaurant, Source};

/// Meters per degree of latitude; the longitude scale shrinks with
/// cos(latitude).
const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Clone)]
pub struct SqliteRestaurantRepository {
    pool: SqlitePool,
}

impl SqliteRestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_external_ids(&self, restaurant_id: i64) -> Result<Vec<(Source, String)>> {
        let rows = sqlx::query(
            "SELECT source, external_id FROM restaurant_external_ids WHERE restaurant_id = ?",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let source_str: String = row.get("source");
            let source = Source::parse(&source_str)
                .ok_or_else(|| anyhow!("unknown source in storage: {source_str}"))?;
            ids.push((source, row.get("external_id")));
        }
        Ok(ids)
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<CanonicalRestaurant> {
        let id: i64 = row.get("id");
        let data_source_str: String = row.get("data_source");
        let data_source = Source::parse(&data_source_str)
            .ok_or_else(|| anyhow!("unknown source in storage: {data_source_str}"))?;
        let local_food: Option<String> = row.get("local_food_category");
        let last_synced_at: DateTime<Utc> = row.get("last_synced_at");

        let mut restaurant = CanonicalRestaurant {
            id,
            name: row.get("name"),
            category: row.get("category"),
            address: row.get("address"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            phone: row.get("phone"),
            data_source,
            external_ids: Default::default(),
            is_good_price_store: row.get::<i64, _>("is_good_price_store") != 0,
            is_local_store: row.get::<i64, _>("is_local_store") != 0,
            local_food_category: local_food.as_deref().and_then(LocalFoodCategoryId::from_str_id),
            is_active: row.get::<i64, _>("is_active") != 0,
            last_synced_at,
        };
        for (source, external_id) in self.load_external_ids(id).await? {
            restaurant.external_ids.insert(source, external_id);
        }
        Ok(restaurant)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, category, address, latitude, longitude, phone, \
     data_source, is_good_price_store, is_local_store, local_food_category, is_active, \
     last_synced_at FROM restaurants";

#[async_trait]
impl RestaurantCatalog for SqliteRestaurantRepository {
    async fn find_by_external_id(
        &self,
        source: Source,
        external_id: &str,
    ) -> Result<Option<CanonicalRestaurant>> {
        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE id = (SELECT restaurant_id FROM restaurant_external_ids \
             WHERE source = ? AND external_id = ?)"
        ))
        .bind(source.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<CanonicalRestaurant>> {
        let lat_delta = radius_meters / METERS_PER_DEGREE;
        let lon_delta = radius_meters / (METERS_PER_DEGREE * latitude.to_radians().cos());

        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?"
        ))
        .bind(latitude - lat_delta)
        .bind(latitude + lat_delta)
        .bind(longitude - lon_delta)
        .bind(longitude + lon_delta)
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::new();
        for row in rows {
            let restaurant = self.hydrate(&row).await?;
            let distance =
                haversine_meters(latitude, longitude, restaurant.latitude, restaurant.longitude);
            if distance <= radius_meters {
                matches.push(restaurant);
            }
        }
        Ok(matches)
    }

    async fn insert(&self, restaurant: &CanonicalRestaurant) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO restaurants
            (name, category, address, latitude, longitude, phone, data_source,
             is_good_price_store, is_local_store, local_food_category, is_active, last_synced_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&restaurant.name)
        .bind(&restaurant.category)
        .bind(&restaurant.address)
        .bind(restaurant.latitude)
        .bind(restaurant.longitude)
        .bind(&restaurant.phone)
        .bind(restaurant.data_source.as_str())
        .bind(restaurant.is_good_price_store)
        .bind(restaurant.is_local_store)
        .bind(restaurant.local_food_category.map(|c| c.as_str()))
        .bind(restaurant.is_active)
        .bind(restaurant.last_synced_at)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        for (source, external_id) in &restaurant.external_ids {
            sqlx::query(
                "INSERT OR REPLACE INTO restaurant_external_ids (restaurant_id, source, external_id) \
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(source.as_str())
            .bind(external_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(id)
    }

    /// The good-price/local-store flags and the local-food tag are floored
    /// at their stored values here, not just in `merge_from`: concurrent
    /// source runs may write back a merge computed from a read taken before
    /// another run set a flag, and that stale state must not clear it.
    async fn update(&self, restaurant: &CanonicalRestaurant) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE restaurants SET
                name = ?, category = ?, address = ?, latitude = ?, longitude = ?, phone = ?,
                is_good_price_store = MAX(is_good_price_store, ?),
                is_local_store = MAX(is_local_store, ?),
                local_food_category = COALESCE(?, local_food_category),
                is_active = ?, last_synced_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&restaurant.name)
        .bind(&restaurant.category)
        .bind(&restaurant.address)
        .bind(restaurant.latitude)
        .bind(restaurant.longitude)
        .bind(&restaurant.phone)
        .bind(restaurant.is_good_price_store)
        .bind(restaurant.is_local_store)
        .bind(restaurant.local_food_category.map(|c| c.as_str()))
        .bind(restaurant.is_active)
        .bind(restaurant.last_synced_at)
        .bind(restaurant.id)
        .execute(&mut *tx)
        .await?;

        for (source, external_id) in &restaurant.external_ids {
            sqlx::query(
                "INSERT OR REPLACE INTO restaurant_external_ids (restaurant_id, source, external_id) \
                 VALUES (?, ?, ?)",
            )
            .bind(restaurant.id)
            .bind(source.as_str())
            .bind(external_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_local_food(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<CanonicalRestaurant>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE local_food_category = ? AND is_active = 1"
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut restaurants = Vec::with_capacity(rows.len());
        for row in rows {
            restaurants.push(self.hydrate(&row).await?);
        }
        Ok(restaurants)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM restaurants")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

/// Read-only view over the review collaborator's price/review tables.
#[derive(Clone)]
pub struct SqlitePriceObservationSource {
    pool: SqlitePool,
}

impl SqlitePriceObservationSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceObservationSource for SqlitePriceObservationSource {
    async fn observations_for(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<Vec<PriceObservation>> {
        let rows = sqlx::query(
            "SELECT restaurant_id, price, observed_at FROM price_observations WHERE category = ?",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PriceObservation {
                category,
                restaurant_id: row.get("restaurant_id"),
                price_minor_units: row.get("price"),
                observed_at: row.get("observed_at"),
            })
            .collect())
    }

    async fn representative_prices(
        &self,
        category: LocalFoodCategoryId,
    ) -> Result<HashMap<i64, i64>> {
        let rows = sqlx::query(
            "SELECT restaurant_id, CAST(AVG(price) AS INTEGER) AS representative \
             FROM price_observations WHERE category = ? GROUP BY restaurant_id",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("restaurant_id"), row.get("representative")))
            .collect())
    }

    async fn review_summaries(
        &self,
        restaurant_ids: &[i64],
    ) -> Result<HashMap<i64, ReviewSummary>> {
        if restaurant_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; restaurant_ids.len()].join(", ");
        let sql = format!(
            "SELECT restaurant_id, average_rating, review_count, satisfaction, image_url \
             FROM review_summaries WHERE restaurant_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql);
        for id in restaurant_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get::<i64, _>("restaurant_id"),
                    ReviewSummary {
                        average_rating: row.get("average_rating"),
                        review_count: row.get::<i64, _>("review_count") as u32,
                        satisfaction: row.get("satisfaction"),
                        image_url: row.get("image_url"),
                    },
                )
            })
            .collect())
    }
}
