//! Batch orchestrator: scheduled ingestion runs, one at a time per source
//!
//! Owns the pagination loop the adapters stay out of: fetch a page, push
//! every record through normalize + reconcile, stop on the upstream's own
//! signals or the hard page ceiling. Per-record problems are counted and
//! the loop continues; a fetch-level failure aborts only that source's
//! run, and the next scheduled trigger is the retry. Sources run on
//! independent, staggered schedules and never block each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::normalizer::normalize;
use crate::application::reconciliation::ReconciliationEngine;
use crate::domain::batch::{BatchResult, RunStats, SourceRunState};
use crate::domain::constants::ingest;
use crate::domain::repositories::AlertNotifier;
use crate::domain::restaurant::{ReconcileOutcome, Source};
use crate::infrastructure::sources::{FetchError, SourceAdapter};

/// Per-run pacing knobs. Defaults come from the domain constants; tests
/// drop the inter-page delay.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub inter_page_delay: Duration,
    pub max_pages_per_run: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            inter_page_delay: Duration::from_millis(ingest::INTER_PAGE_DELAY_MS),
            max_pages_per_run: ingest::MAX_PAGES_PER_RUN,
        }
    }
}

/// A source's daily schedule: staggered offsets keep the sources from
/// contending for the catalog write path at the same moment.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SourceSchedule {
    pub initial_delay_secs: u64,
    pub interval_secs: u64,
}

pub struct BatchOrchestrator {
    engine: ReconciliationEngine,
    notifier: Arc<dyn AlertNotifier>,
    config: OrchestratorConfig,
    shutdown: CancellationToken,
    running: HashMap<Source, AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(
        engine: ReconciliationEngine,
        notifier: Arc<dyn AlertNotifier>,
        config: OrchestratorConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let running = Source::ALL
            .iter()
            .map(|source| (*source, AtomicBool::new(false)))
            .collect();
        Self { engine, notifier, config, shutdown, running }
    }

    /// Current run state for inspection and tests.
    pub fn source_state(&self, source: Source) -> SourceRunState {
        let running = self
            .running
            .get(&source)
            .map_or(false, |flag| flag.load(Ordering::Acquire));
        if running {
            SourceRunState::Running
        } else {
            SourceRunState::Idle
        }
    }

    /// Triggers one ingestion run for the adapter's source. Returns `None`
    /// when a run for that source is already in flight (the trigger is a
    /// logged no-op).
    pub async fn trigger(&self, adapter: &dyn SourceAdapter) -> Option<BatchResult> {
        let source = adapter.source();
        let flag = self.running.get(&source)?;
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(%source, "run already in progress, skipping trigger");
            return None;
        }

        let result = self.execute_run(adapter).await;

        if result.is_failure() {
            self.notifier.notify_failure(&result).await;
        } else if result.stats.success > 0 {
            self.notifier.notify_success(&result).await;
        }

        flag.store(false, Ordering::Release);
        Some(result)
    }

    /// Runs the adapter on its schedule until shutdown. Intended to be
    /// spawned once per source.
    pub async fn run_schedule(self: Arc<Self>, adapter: Arc<dyn SourceAdapter>, schedule: SourceSchedule) {
        let source = adapter.source();
        tracing::info!(%source, delay = schedule.initial_delay_secs, interval = schedule.interval_secs,
            "schedule started");

        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(schedule.initial_delay_secs)) => {}
            () = self.shutdown.cancelled() => return,
        }

        loop {
            self.trigger(adapter.as_ref()).await;
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(schedule.interval_secs)) => {}
                () = self.shutdown.cancelled() => {
                    tracing::info!(%source, "schedule stopped by shutdown");
                    return;
                }
            }
        }
    }

    async fn execute_run(&self, adapter: &dyn SourceAdapter) -> BatchResult {
        let source = adapter.source();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut stats = RunStats::default();
        let mut error_message = None;

        tracing::info!(%source, %run_id, "ingestion run started");

        let mut page_no: u32 = 1;
        let mut accumulated: u32 = 0;
        loop {
            if self.shutdown.is_cancelled() {
                // Partially processed pages are not retried here; the next
                // schedule re-ingests idempotently.
                error_message = Some("run aborted by shutdown".to_string());
                stats.error += 1;
                break;
            }

            let page = match adapter.fetch_page(page_no).await {
                Ok(page) => page,
                Err(err) => {
                    match &err {
                        FetchError::RateLimited => {
                            tracing::error!(%source, page_no, "upstream rate limit hit, aborting run");
                        }
                        FetchError::Transient(msg) => {
                            tracing::warn!(%source, page_no, %msg, "transient fetch failure, aborting run");
                        }
                        FetchError::Schema(msg) => {
                            tracing::error!(%source, page_no, %msg, "upstream schema mismatch, aborting run");
                        }
                    }
                    stats.error += 1;
                    error_message = Some(err.to_string());
                    break;
                }
            };

            accumulated += page.records.len() as u32;
            for record in &page.records {
                stats.total += 1;
                let normalized = match normalize(record) {
                    Ok(normalized) => normalized,
                    Err(reason) => {
                        tracing::debug!(%source, %reason, "record rejected");
                        stats.skip += 1;
                        continue;
                    }
                };
                match self.engine.reconcile(&normalized).await {
                    Ok(ReconcileOutcome::Created(_) | ReconcileOutcome::Updated(_)) => {
                        stats.success += 1;
                    }
                    Ok(
                        ReconcileOutcome::SkippedDuplicate { .. }
                        | ReconcileOutcome::SkippedInvalid,
                    ) => {
                        stats.skip += 1;
                    }
                    Err(err) => {
                        tracing::warn!(%source, external_id = %normalized.external_id, %err,
                            "record reconciliation failed");
                        stats.error += 1;
                    }
                }
            }

            if page.is_last_page || accumulated >= page.total_count {
                break;
            }
            if page_no >= self.config.max_pages_per_run {
                tracing::warn!(%source, pages = page_no, reported_total = page.total_count,
                    "page ceiling reached before reported total, stopping run");
                break;
            }
            page_no += 1;
            tokio::time::sleep(self.config.inter_page_delay).await;
        }

        let result = BatchResult {
            source,
            run_id,
            started_at,
            finished_at: Utc::now(),
            stats,
            error_message,
        };
        tracing::info!(%source, %run_id, total = stats.total, success = stats.success,
            skip = stats.skip, error = stats.error, failed = result.is_failure(),
            "ingestion run finished");
        result
    }
}
