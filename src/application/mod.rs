//! Application layer
//!
//! Pipeline services coordinating the domain types: per-source field
//! normalization, reconciliation into the canonical catalog, price
//! statistics, price-range search, and the batch orchestrator.

pub mod normalizer;
pub mod orchestrator;
pub mod reconciliation;
pub mod search;
pub mod statistics;

pub use orchestrator::{BatchOrchestrator, OrchestratorConfig, SourceSchedule};
pub use reconciliation::ReconciliationEngine;
pub use search::PriceRangeSearch;
pub use statistics::PriceStatisticsEngine;
