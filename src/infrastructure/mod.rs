//! Infrastructure layer
//!
//! Registry adapters, HTTP transport, SQLite persistence, configuration,
//! logging, and the statistics cache.

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod restaurant_repository;
pub mod sources;
pub mod stats_cache;

pub use config::AppConfig;
pub use database_connection::DatabaseConnection;
pub use http_client::{HttpClient, HttpClientConfig};
pub use restaurant_repository::{SqlitePriceObservationSource, SqliteRestaurantRepository};
pub use stats_cache::StatisticsCache;
