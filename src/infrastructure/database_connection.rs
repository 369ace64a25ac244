// Database connection and pool management for the catalog store (SQLite via sqlx)

use std::path::Path;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if db_path != ":memory:" && !Path::new(db_path).exists() {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            std::fs::File::create(db_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_restaurants_sql = r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                address TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                phone TEXT,
                data_source TEXT NOT NULL,
                is_good_price_store INTEGER NOT NULL DEFAULT 0,
                is_local_store INTEGER NOT NULL DEFAULT 0,
                local_food_category TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                last_synced_at DATETIME NOT NULL
            )
        "#;

        let create_external_ids_sql = r#"
            CREATE TABLE IF NOT EXISTS restaurant_external_ids (
                restaurant_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                external_id TEXT NOT NULL,
                PRIMARY KEY (restaurant_id, source),
                FOREIGN KEY (restaurant_id) REFERENCES restaurants (id) ON DELETE CASCADE
            )
        "#;

        // Owned by the review collaborator; this pipeline only reads them.
        let create_observations_sql = r#"
            CREATE TABLE IF NOT EXISTS price_observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                restaurant_id INTEGER NOT NULL,
                price INTEGER NOT NULL,
                observed_at DATETIME NOT NULL
            )
        "#;

        let create_review_summaries_sql = r#"
            CREATE TABLE IF NOT EXISTS review_summaries (
                restaurant_id INTEGER PRIMARY KEY,
                average_rating REAL NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                satisfaction REAL NOT NULL DEFAULT 0,
                image_url TEXT
            )
        "#;

        let create_indexes_sql = r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_external_ids_source
                ON restaurant_external_ids (source, external_id);
            CREATE INDEX IF NOT EXISTS idx_restaurants_geo
                ON restaurants (latitude, longitude);
            CREATE INDEX IF NOT EXISTS idx_restaurants_local_food
                ON restaurants (local_food_category);
            CREATE INDEX IF NOT EXISTS idx_observations_category
                ON price_observations (category);
        "#;

        sqlx::query(create_restaurants_sql).execute(&self.pool).await?;
        sqlx::query(create_external_ids_sql).execute(&self.pool).await?;
        sqlx::query(create_observations_sql).execute(&self.pool).await?;
        sqlx::query(create_review_summaries_sql).execute(&self.pool).await?;
        for statement in create_indexes_sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }
}
