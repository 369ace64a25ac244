//! Restaurant catalog entities
//!
//! Core types flowing through the ingestion pipeline: the raw payload as
//! received from a registry, the normalized intermediate record, and the
//! canonical restaurant the reconciliation engine owns.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::local_food::LocalFoodCategoryId;

/// External registry supplying restaurant data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Provincial tourism-content API (JSON)
    TourismApi,
    /// Commercial map-search API (JSON)
    MapSearch,
    /// Jeju-si good-price store registry (JSON)
    GoodPriceJeju,
    /// Seogwipo-si good-price store registry (XML)
    GoodPriceSeogwipo,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::TourismApi,
        Source::MapSearch,
        Source::GoodPriceJeju,
        Source::GoodPriceSeogwipo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::TourismApi => "tourism_api",
            Source::MapSearch => "map_search",
            Source::GoodPriceJeju => "good_price_jeju",
            Source::GoodPriceSeogwipo => "good_price_seogwipo",
        }
    }

    /// Inverse of [`Source::as_str`], for values loaded from storage.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|source| source.as_str() == s)
    }

    /// Whether this source is a municipal fair-price registry.
    ///
    /// Records from these registries set the monotonic good-price flag.
    pub fn is_good_price_registry(&self) -> bool {
        matches!(self, Source::GoodPriceJeju | Source::GoodPriceSeogwipo)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record as received from a registry, before normalization.
///
/// JSON sources pass their item object through as-is; the XML registry is
/// decoded into the same key/value shape by its adapter. Transient: dropped
/// once normalization has produced a [`NormalizedRecord`] or a reject.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub source: Source,
    pub payload: serde_json::Value,
}

impl RawRecord {
    pub fn new(source: Source, payload: serde_json::Value) -> Self {
        Self { source, payload }
    }

    /// String field lookup, treating empty strings as absent.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Field that may arrive as either a JSON number or a numeric string.
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        let value = self.payload.get(key)?;
        if let Some(n) = value.as_f64() {
            return Some(n);
        }
        value.as_str()?.trim().parse().ok()
    }
}

/// Common intermediate shape produced by the field normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: Source,
    pub external_id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub menu_text: Option<String>,
}

/// Why the normalizer refused a raw record. Per-record, never fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("required field '{0}' missing")]
    MissingRequiredField(&'static str),

    #[error("unparsable coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("coordinate ({latitude}, {longitude}) outside service region")]
    OutOfRegion { latitude: f64, longitude: f64 },

    #[error("industry category '{0}' not in allow-list")]
    UnsupportedCategory(String),
}

/// One reconciled record per physical establishment, merged across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRestaurant {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    /// Source that first created this record
    pub data_source: Source,
    /// One entry per source that has ever matched this record; append-only.
    pub external_ids: BTreeMap<Source, String>,
    /// Monotonic: set by a good-price registry match, never cleared by others.
    pub is_good_price_store: bool,
    /// Monotonic: set when a local-food category has been detected.
    pub is_local_store: bool,
    /// Detected regional-food tag; a non-detecting sync never clears it.
    pub local_food_category: Option<LocalFoodCategoryId>,
    pub is_active: bool,
    pub last_synced_at: DateTime<Utc>,
}

impl CanonicalRestaurant {
    /// Builds a fresh canonical record from a normalized one. The caller
    /// assigns the id (0 until the catalog has persisted it).
    pub fn from_normalized(record: &NormalizedRecord, tag: Option<LocalFoodCategoryId>) -> Self {
        let mut external_ids = BTreeMap::new();
        external_ids.insert(record.source, record.external_id.clone());
        Self {
            id: 0,
            name: record.name.clone(),
            category: record.category.clone(),
            address: record.address.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            phone: record.phone.clone(),
            data_source: record.source,
            external_ids,
            is_good_price_store: record.source.is_good_price_registry(),
            is_local_store: tag.is_some(),
            local_food_category: tag,
            is_active: true,
            last_synced_at: Utc::now(),
        }
    }

    /// Merges a newer sync into this record.
    ///
    /// Latest source wins for the mutable fields; the good-price and
    /// local-store flags only ever go true; external ids accumulate.
    pub fn merge_from(&mut self, record: &NormalizedRecord, tag: Option<LocalFoodCategoryId>) {
        self.name = record.name.clone();
        self.category = record.category.clone();
        self.address = record.address.clone();
        self.latitude = record.latitude;
        self.longitude = record.longitude;
        if record.phone.is_some() {
            self.phone = record.phone.clone();
        }
        self.external_ids
            .insert(record.source, record.external_id.clone());
        self.is_good_price_store |= record.source.is_good_price_registry();
        if tag.is_some() {
            self.local_food_category = tag;
            self.is_local_store = true;
        }
        self.is_active = true;
        self.last_synced_at = Utc::now();
    }
}

/// Result of resolving one normalized record against the canonical catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No existing record matched; a new canonical record was created.
    Created(i64),
    /// An existing record was matched and updated in place.
    Updated(i64),
    /// More than one nearby candidate matched by name; skipped rather than
    /// guessed.
    SkippedDuplicate { candidates: usize },
    /// The record failed a final sanity check (e.g. name empty after
    /// normalization).
    SkippedInvalid,
}
