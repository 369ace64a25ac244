//! Ingestion daemon entry point
//!
//! Wires configuration, the SQLite catalog, the four registry adapters,
//! and the batch orchestrator together, then runs the per-source schedules
//! until SIGINT.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use jeju_dining_catalog::application::{
    BatchOrchestrator, OrchestratorConfig, PriceStatisticsEngine, ReconciliationEngine,
};
use jeju_dining_catalog::domain::repositories::LogNotifier;
use jeju_dining_catalog::infrastructure::sources::{
    GoodPriceJejuAdapter, GoodPriceSeogwipoAdapter, MapSearchAdapter, SourceAdapter,
    TourismApiAdapter,
};
use jeju_dining_catalog::infrastructure::{
    logging::init_logging, AppConfig, DatabaseConnection, HttpClient,
    SqlitePriceObservationSource, SqliteRestaurantRepository, StatisticsCache,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/catalog.json"));
    let config = AppConfig::load(&config_path).await?;

    let _log_guard = init_logging(&config.logging)?;
    info!(config = %config_path.display(), "jeju dining catalog starting");

    let db = DatabaseConnection::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database: {}", config.database_url))?;
    db.migrate().await.context("database migration failed")?;

    let catalog = Arc::new(SqliteRestaurantRepository::new(db.pool().clone()));
    let observations = Arc::new(SqlitePriceObservationSource::new(db.pool().clone()));

    let shutdown = CancellationToken::new();
    let http = Arc::new(HttpClient::new(config.http.clone())?);

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(TourismApiAdapter::new(
            http.clone(),
            config.sources.tourism.clone(),
            shutdown.clone(),
        )),
        Arc::new(MapSearchAdapter::new(
            http.clone(),
            config.sources.map_search.clone(),
            shutdown.clone(),
        )),
        Arc::new(GoodPriceJejuAdapter::new(
            http.clone(),
            config.sources.good_price_jeju.clone(),
            shutdown.clone(),
        )),
        Arc::new(GoodPriceSeogwipoAdapter::new(
            http.clone(),
            config.sources.good_price_seogwipo.clone(),
            shutdown.clone(),
        )),
    ];
    let schedules = [
        config.schedules.tourism,
        config.schedules.map_search,
        config.schedules.good_price_jeju,
        config.schedules.good_price_seogwipo,
    ];

    let engine = ReconciliationEngine::new(catalog);
    let notifier = Arc::new(LogNotifier);
    let orchestrator = Arc::new(BatchOrchestrator::new(
        engine,
        notifier,
        OrchestratorConfig::default(),
        shutdown.clone(),
    ));

    let mut schedule_tasks = Vec::with_capacity(adapters.len());
    for (adapter, schedule) in adapters.into_iter().zip(schedules) {
        let orchestrator = orchestrator.clone();
        schedule_tasks.push(tokio::spawn(orchestrator.run_schedule(adapter, schedule)));
    }

    // Statistics cache warms on boot and again whenever the TTL lapses on
    // access; the daemon keeps it alive for search frontends sharing the db.
    let stats_cache = Arc::new(StatisticsCache::new(
        PriceStatisticsEngine::new(observations),
        Duration::from_secs(config.cache_ttl_seconds),
    ));
    if let Err(err) = stats_cache.rebuild_all().await {
        tracing::warn!(%err, "initial statistics warm-up failed, continuing");
    }

    tokio::signal::ctrl_c().await.context("failed to listen for SIGINT")?;
    info!("shutdown signal received, stopping schedules");
    shutdown.cancel();

    for task in schedule_tasks {
        let _ = task.await;
    }
    info!("all schedules stopped, bye");
    Ok(())
}
