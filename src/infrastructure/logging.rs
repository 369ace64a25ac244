//! Logging initialization
//!
//! Console logging via tracing-subscriber with an EnvFilter, plus an
//! optional daily-rotated file appender. Timestamps are rendered in KST,
//! the timezone the registries and their maintenance windows live in.

use anyhow::Result;
use chrono::{FixedOffset, Utc};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::infrastructure::config::LoggingConfig;

/// KST (UTC+9) timestamp formatter
struct KstTime;

impl FormatTime for KstTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let kst = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        write!(w, "{}", Utc::now().with_timezone(&kst).format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initializes the global subscriber. Returns the file writer guard, which
/// must stay alive for the process lifetime when file output is enabled.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jeju_dining_catalog={}", config.level)));

    let console_layer = fmt::layer().with_timer(KstTime).with_target(true);

    if config.file_output {
        let appender = rolling::daily(&config.log_dir, "ingest.log");
        let (writer, guard) = non_blocking(appender);
        let file_layer = fmt::layer()
            .with_timer(KstTime)
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
        Ok(None)
    }
}
