//! Jeju dining catalog ingestion pipeline
//!
//! Pulls restaurant records from four public registries, normalizes their
//! heterogeneous field layouts, reconciles them into one canonical catalog
//! record per establishment, tags regional local-food specialties, and
//! serves cached price statistics and price-range search over the result.

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_support;
