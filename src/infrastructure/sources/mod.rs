//! Source adapters for the external restaurant registries
//!
//! One adapter per registry. Each owns its base URL, page size, and
//! auth-key embedding, and exposes the common page triple to the
//! orchestrator. Fetching is separated from decoding: the decode functions
//! are pure so they can be exercised on fixture payloads without HTTP.

pub mod good_price;
pub mod map_search;
pub mod tourism;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::restaurant::RawRecord;

pub use good_price::{GoodPriceJejuAdapter, GoodPriceSeogwipoAdapter};
pub use map_search::MapSearchAdapter;
pub use tourism::TourismApiAdapter;

/// Fetch-level failure. Aborts the current run for that source only; the
/// next scheduled trigger is the retry mechanism.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeout or connection failure; retried at the next schedule.
    #[error("transient network error: {0}")]
    Transient(String),

    /// HTTP 429 or quota exhaustion; logged prominently, no immediate retry.
    #[error("rate limited by upstream")]
    RateLimited,

    /// The payload did not match the expected shape.
    #[error("unexpected payload shape: {0}")]
    Schema(String),
}

/// One decoded page from a registry.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub records: Vec<RawRecord>,
    /// Upstream's claim of the total record count. Treated as a hint; the
    /// orchestrator's page ceiling guards against it being wrong.
    pub total_count: u32,
    pub is_last_page: bool,
}

/// A paginated external registry.
///
/// Pagination is 1-based for every current registry. The pagination loop
/// itself is owned by the orchestrator.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> crate::domain::restaurant::Source;

    async fn fetch_page(&self, page_no: u32) -> Result<SourcePage, FetchError>;
}
