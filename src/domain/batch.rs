//! Batch run state and outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::restaurant::Source;

/// Per-source run state. A scheduled trigger while `Running` is a logged
/// no-op, guaranteeing at most one concurrent run per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceRunState {
    Idle,
    Running,
}

/// Record-level counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Records seen across all fetched pages
    pub total: u32,
    /// Created or updated canonical records
    pub success: u32,
    /// Normalization rejects and ambiguous matches
    pub skip: u32,
    /// Per-record processing failures
    pub error: u32,
}

/// Summary of one ingestion run. Produced regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub source: Source,
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: RunStats,
    /// Set when the run aborted with a fetch-level failure.
    pub error_message: Option<String>,
}

impl BatchResult {
    pub fn is_failure(&self) -> bool {
        self.error_message.is_some()
    }
}
