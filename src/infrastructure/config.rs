//! Configuration loading and defaults
//!
//! JSON config file with serde-derived structs and full defaults: a
//! missing file means a default configuration, not a startup failure.
//! Service keys are the only values with no usable default.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::application::orchestrator::SourceSchedule;
use crate::domain::constants::pricing;
use crate::infrastructure::http_client::HttpClientConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub http: HttpClientConfig,
    pub sources: SourcesConfig,
    pub schedules: SchedulesConfig,
    pub cache_ttl_seconds: u64,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/catalog.db".to_string(),
            http: HttpClientConfig::default(),
            sources: SourcesConfig::default(),
            schedules: SchedulesConfig::default(),
            cache_ttl_seconds: pricing::CACHE_TTL_SECONDS,
            logging: LoggingConfig::default(),
        }
    }
}

/// Endpoint settings for the `{items, totalCount, pageNo}` registries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub base_url: String,
    pub service_key: String,
    pub page_size: u32,
}

/// Endpoint settings for the map-search registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSearchEndpoint {
    pub base_url: String,
    pub rest_api_key: String,
    /// Keyword anchoring the search, e.g. "제주 맛집"
    pub query: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_meters: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub tourism: SourceEndpoint,
    pub map_search: MapSearchEndpoint,
    pub good_price_jeju: SourceEndpoint,
    pub good_price_seogwipo: SourceEndpoint,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tourism: SourceEndpoint {
                base_url: "https://api.visitjeju.net/vsjApi/contents/searchList".to_string(),
                service_key: String::new(),
                page_size: 100,
            },
            map_search: MapSearchEndpoint {
                base_url: "https://dapi.kakao.com/v2/local/search/keyword.json".to_string(),
                rest_api_key: String::new(),
                query: "제주 맛집".to_string(),
                center_latitude: 33.4996,
                center_longitude: 126.5312,
                radius_meters: 20_000,
                page_size: 15,
            },
            good_price_jeju: SourceEndpoint {
                base_url: "https://api.jejuittem.or.kr/goodPrice/jeju".to_string(),
                service_key: String::new(),
                page_size: 50,
            },
            good_price_seogwipo: SourceEndpoint {
                base_url: "https://api.jejuittem.or.kr/goodPrice/seogwipo".to_string(),
                service_key: String::new(),
                page_size: 50,
            },
        }
    }
}

/// Per-source schedules. Defaults run daily, staggered fifteen minutes
/// apart so the sources do not contend for the catalog write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulesConfig {
    pub tourism: SourceSchedule,
    pub map_search: SourceSchedule,
    pub good_price_jeju: SourceSchedule,
    pub good_price_seogwipo: SourceSchedule,
}

const DAY_SECS: u64 = 24 * 60 * 60;
const STAGGER_SECS: u64 = 15 * 60;

impl Default for SchedulesConfig {
    fn default() -> Self {
        Self {
            tourism: SourceSchedule { initial_delay_secs: 0, interval_secs: DAY_SECS },
            map_search: SourceSchedule { initial_delay_secs: STAGGER_SECS, interval_secs: DAY_SECS },
            good_price_jeju: SourceSchedule {
                initial_delay_secs: 2 * STAGGER_SECS,
                interval_secs: DAY_SECS,
            },
            good_price_seogwipo: SourceSchedule {
                initial_delay_secs: 3 * STAGGER_SECS,
                interval_secs: DAY_SECS,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub file_output: bool,
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            log_dir: "logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config file, falling back to defaults when it does not
    /// exist yet.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Writes the current configuration back (used to seed a starter file).
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
